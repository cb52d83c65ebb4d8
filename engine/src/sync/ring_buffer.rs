use std::{
    cell::UnsafeCell,
    mem::MaybeUninit,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use crossbeam::utils::CachePadded;

struct Shared<T> {
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
    // Both indices grow forever (wrapping) and are reduced modulo capacity on access.
    // head is only written by the consumer, tail only by the producer.
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
}

// Safety: a slot is accessed by exactly one side at a time. The producer only writes slots in
// [tail, head + capacity) and the consumer only reads slots in [head, tail); ownership of a slot
// changes hands through the release store of the index that covers it.
unsafe impl<T: Send> Send for Shared<T> {}
unsafe impl<T: Send> Sync for Shared<T> {}

impl<T> Shared<T> {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, index: usize) -> *mut MaybeUninit<T> {
        self.slots[index % self.capacity()].get()
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        let head = *self.head.get_mut();
        let tail = *self.tail.get_mut();
        let mut index = head;
        while index != tail {
            // Safety: every slot in [head, tail) was written by the producer and never read
            unsafe { (*self.slot(index)).assume_init_drop() };
            index = index.wrapping_add(1);
        }
    }
}

/// Creates a bounded single-producer single-consumer queue.
/// Neither side ever blocks: pushing to a full queue and popping from an empty one fail instead.
pub fn ring_buffer<T>(capacity: usize) -> (RingProducer<T>, RingConsumer<T>) {
    assert!(capacity > 0, "Ring buffer capacity must be positive");

    let slots = (0..capacity)
        .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
        .collect::<Vec<_>>()
        .into_boxed_slice();

    let shared = Arc::new(Shared {
        slots,
        head: CachePadded::new(AtomicUsize::new(0)),
        tail: CachePadded::new(AtomicUsize::new(0)),
    });

    (
        RingProducer {
            shared: shared.clone(),
        },
        RingConsumer { shared },
    )
}

pub struct RingProducer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> RingProducer<T> {
    /// Appends a value, handing it back if the queue is full.
    pub fn push(&mut self, value: T) -> Result<(), T> {
        let tail = self.shared.tail.load(Ordering::Relaxed);
        let head = self.shared.head.load(Ordering::Acquire);

        if tail.wrapping_sub(head) == self.shared.capacity() {
            return Err(value);
        }

        // Safety: the slot at tail is outside [head, tail), so the consumer isn't touching it,
        // and the acquire load of head guarantees the consumer's previous read of it finished
        unsafe { (*self.shared.slot(tail)).write(value) };
        self.shared
            .tail
            .store(tail.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    pub fn len(&self) -> usize {
        let tail = self.shared.tail.load(Ordering::Relaxed);
        let head = self.shared.head.load(Ordering::Acquire);
        tail.wrapping_sub(head)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.shared.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }
}

pub struct RingConsumer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> RingConsumer<T> {
    /// Removes the oldest value, or returns None if the queue is empty.
    pub fn pop(&mut self) -> Option<T> {
        let head = self.shared.head.load(Ordering::Relaxed);
        let tail = self.shared.tail.load(Ordering::Acquire);

        if head == tail {
            return None;
        }

        // Safety: the slot is in [head, tail), and the acquire load of tail makes the
        // producer's write to it visible
        let value = unsafe { (*self.shared.slot(head)).assume_init_read() };
        self.shared
            .head
            .store(head.wrapping_add(1), Ordering::Release);
        Some(value)
    }

    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        std::iter::from_fn(move || self.pop())
    }

    pub fn len(&self) -> usize {
        let head = self.shared.head.load(Ordering::Relaxed);
        let tail = self.shared.tail.load(Ordering::Acquire);
        tail.wrapping_sub(head)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }
}
