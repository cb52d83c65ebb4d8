use crate::{
    rendering::gpu_backend::{GpuBackend, MeshRecord},
    task_buffer::{RenderTask, TaskBuffer, TaskConsumer},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStatistics {
    /// Lap of the task buffer applied this frame, if one was ready
    pub applied_lap: Option<u64>,
    pub removals: u32,
    pub uploads: u32,
    pub draws: u32,
    pub faces_drawn: u64,
}

/// Consumer side of mesh streaming. Applies the task buffers published by the chunk loader
/// to a `GpuBackend` and draws the resident meshes every frame. Never blocks.
pub struct MeshRenderer<G: GpuBackend> {
    consumer: TaskConsumer,
    // Indexed by the slot the loader allocated for the mesh
    records: Vec<Option<MeshRecord<G::Handle>>>,
    render_list: Vec<RenderTask>,
}

impl<G: GpuBackend> MeshRenderer<G> {
    pub fn new(consumer: TaskConsumer) -> Self {
        Self {
            consumer,
            records: Vec::new(),
            render_list: Vec::new(),
        }
    }

    pub fn resident_meshes(&self) -> usize {
        self.records.iter().filter(|record| record.is_some()).count()
    }

    pub fn render_list(&self) -> &[RenderTask] {
        &self.render_list
    }

    pub fn laps_applied(&self) -> u64 {
        self.consumer.laps_received()
    }

    #[profiling::function]
    pub fn frame(&mut self, gpu: &mut G) -> FrameStatistics {
        let mut statistics = FrameStatistics::default();

        let records = &mut self.records;
        let render_list = &mut self.render_list;
        let applied = self.consumer.drain(|buffer| {
            let (removals, uploads) = apply(buffer, records, render_list, gpu);
            (buffer.lap(), removals, uploads)
        });

        if let Some((lap, removals, uploads)) = applied {
            statistics.applied_lap = Some(lap);
            statistics.removals = removals;
            statistics.uploads = uploads;
        }

        for task in &self.render_list {
            if let Some(record) = self.records.get(task.slot as usize).and_then(Option::as_ref) {
                gpu.draw(&record.handle, task.position);
                statistics.draws += 1;
                statistics.faces_drawn += record.face_count as u64;
            }
        }

        statistics
    }

    /// Releases every GPU resource the renderer still holds.
    pub fn release_all(&mut self, gpu: &mut G) {
        for record in self.records.iter_mut().filter_map(Option::take) {
            gpu.release(record.handle);
        }
        self.render_list.clear();
    }
}

// Removals first: the loader may have handed a freed slot to a new mesh in the same lap.
fn apply<G: GpuBackend>(
    buffer: &mut TaskBuffer,
    records: &mut Vec<Option<MeshRecord<G::Handle>>>,
    render_list: &mut Vec<RenderTask>,
    gpu: &mut G,
) -> (u32, u32) {
    let mut removals = 0;
    for removal in buffer.removals.drain(..) {
        match records.get_mut(removal.slot as usize).and_then(Option::take) {
            Some(record) => {
                debug_assert_eq!(record.position, removal.position);
                gpu.release(record.handle);
                removals += 1;
            }
            None => log::warn!(
                "Removal of empty mesh slot {} at {:?}",
                removal.slot,
                removal.position
            ),
        }
    }

    render_list.clear();
    render_list.append(&mut buffer.renders);

    let mut uploads = 0;
    for upload in buffer.uploads.drain(..) {
        let slot = upload.slot as usize;
        if slot >= records.len() {
            records.resize_with(slot + 1, || None);
        }

        let record = MeshRecord {
            handle: gpu.upload(&upload.mesh),
            face_count: upload.mesh.total_faces() as u32,
            position: upload.position(),
        };

        if let Some(previous) = records[slot].replace(record) {
            log::warn!(
                "Mesh slot {} was still occupied by {:?}",
                upload.slot,
                previous.position
            );
            gpu.release(previous.handle);
        }

        render_list.push(RenderTask {
            slot: upload.slot,
            position: upload.position(),
        });
        uploads += 1;
    }

    (removals, uploads)
}
