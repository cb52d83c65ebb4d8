//! The pair of task lists exchanged between the chunk loader and the mesh renderer.
//!
//! Exactly two [`TaskBuffer`]s exist. Ownership of a buffer is the permission to touch it:
//! the loader holds one inside its [`TaskProducer`] and writes it, the other one is either
//! waiting in the ready channel, held by the renderer while it drains it, or waiting in the
//! drained channel to be reused. A buffer is never reachable from both sides at once.

use std::{sync::Arc, time::Duration, time::Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, select};

use crate::{clock::Clock, mesh_generation::chunk_mesh::ChunkMeshData, voxels::coord::ChunkPos};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveTask {
    pub slot: u32,
    pub position: ChunkPos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTask {
    pub slot: u32,
    pub position: ChunkPos,
}

#[derive(Debug)]
pub struct UploadTask {
    pub slot: u32,
    pub mesh: ChunkMeshData,
}

impl UploadTask {
    pub fn position(&self) -> ChunkPos {
        self.mesh.position
    }
}

#[derive(Debug)]
pub struct TaskBuffer {
    parity: bool,
    lap: u64,
    pub removals: Vec<RemoveTask>,
    pub renders: Vec<RenderTask>,
    pub uploads: Vec<UploadTask>,
}

impl TaskBuffer {
    fn new(parity: bool) -> Self {
        Self {
            parity,
            lap: 0,
            removals: Vec::new(),
            renders: Vec::new(),
            uploads: Vec::new(),
        }
    }

    /// Which of the two buffers this is
    pub fn parity(&self) -> bool {
        self.parity
    }

    /// Loader lap that filled this buffer
    pub fn lap(&self) -> u64 {
        self.lap
    }

    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.renders.is_empty() && self.uploads.is_empty()
    }

    fn clear(&mut self) {
        self.removals.clear();
        self.renders.clear();
        self.uploads.clear();
    }
}

/// Returned by [`TaskProducer::swap`] when the wait was interrupted or the other side is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("task buffer swap cancelled")]
pub struct SwapCancelled;

/// Creates the exchange. The producer starts out owning the first buffer and the second one
/// is already waiting in the drained channel, so the first swap only waits for the loader.
pub fn task_exchange(
    min_swap_interval: Duration,
    clock: Arc<dyn Clock>,
) -> (TaskProducer, TaskConsumer) {
    let (ready_sender, ready_receiver) = crossbeam_channel::bounded(1);
    let (drained_sender, drained_receiver) = crossbeam_channel::bounded(1);

    drained_sender
        .try_send(TaskBuffer::new(true))
        .unwrap_or_else(|_| unreachable!("fresh channel has room for one buffer"));

    let producer = TaskProducer {
        current: TaskBuffer::new(false),
        ready_sender,
        drained_receiver,
        min_swap_interval,
        last_swap: None,
        clock,
    };

    let consumer = TaskConsumer {
        ready_receiver,
        drained_sender,
        next_lap: 0,
    };

    (producer, consumer)
}

pub struct TaskProducer {
    current: TaskBuffer,
    ready_sender: Sender<TaskBuffer>,
    drained_receiver: Receiver<TaskBuffer>,
    min_swap_interval: Duration,
    last_swap: Option<Instant>,
    clock: Arc<dyn Clock>,
}

impl TaskProducer {
    pub fn buffer(&self) -> &TaskBuffer {
        &self.current
    }

    pub fn buffer_mut(&mut self) -> &mut TaskBuffer {
        &mut self.current
    }

    /// Lap number the current buffer will be published as
    pub fn lap(&self) -> u64 {
        self.current.lap
    }

    /// Publishes the current buffer and takes ownership of the drained one.
    ///
    /// Sleeps out the remainder of the minimum swap interval, then blocks until the renderer
    /// has returned the other buffer. Either wait ends early with [`SwapCancelled`] when
    /// `cancel` receives a message or disconnects. The in-progress buffer is kept, not
    /// published, when the swap is cancelled.
    #[profiling::function]
    pub fn swap<C>(&mut self, cancel: &Receiver<C>) -> Result<(), SwapCancelled> {
        if let Some(last_swap) = self.last_swap {
            let elapsed = self.clock.now().saturating_duration_since(last_swap);
            let remaining = self.min_swap_interval.saturating_sub(elapsed);

            if !remaining.is_zero() {
                match cancel.recv_timeout(remaining) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(_) | Err(RecvTimeoutError::Disconnected) => return Err(SwapCancelled),
                }
            }
        }

        let mut drained = select! {
            recv(self.drained_receiver) -> buffer => buffer.map_err(|_| SwapCancelled)?,
            recv(cancel) -> _ => return Err(SwapCancelled),
        };

        assert_ne!(
            drained.parity, self.current.parity,
            "Drained buffer has the same parity as the buffer being written"
        );

        drained.clear();
        drained.lap = self.current.lap + 1;
        let filled = std::mem::replace(&mut self.current, drained);

        // The ready channel is empty here: its only possible occupant is the buffer we just got back.
        self.ready_sender.send(filled).map_err(|_| SwapCancelled)?;
        self.last_swap = Some(self.clock.now());

        Ok(())
    }
}

pub struct TaskConsumer {
    ready_receiver: Receiver<TaskBuffer>,
    drained_sender: Sender<TaskBuffer>,
    next_lap: u64,
}

impl TaskConsumer {
    /// Runs `drain` on the published buffer, if there is one, and hands the buffer back
    /// to the producer afterwards. Never blocks.
    pub fn drain<R>(&mut self, drain: impl FnOnce(&mut TaskBuffer) -> R) -> Option<R> {
        let mut buffer = match self.ready_receiver.try_recv() {
            Ok(buffer) => buffer,
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => return None,
        };

        assert_eq!(
            buffer.lap, self.next_lap,
            "Task buffers must arrive in lap order"
        );
        assert_eq!(
            buffer.parity,
            buffer.lap % 2 == 1,
            "Task buffer parity must alternate"
        );
        self.next_lap += 1;

        let result = drain(&mut buffer);

        buffer.clear();
        if self.drained_sender.try_send(buffer).is_err() {
            log::debug!("Chunk loader is gone, dropping drained task buffer");
        }

        Some(result)
    }

    /// Number of buffers drained so far
    pub fn laps_received(&self) -> u64 {
        self.next_lap
    }
}
