use std::{
    cell::UnsafeCell,
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
};

const INDEX_MASK: u8 = 0b011;
const DIRTY_BIT: u8 = 0b100;

struct Shared<T> {
    slots: [UnsafeCell<T>; 3],
    // Index of the middle slot, plus DIRTY_BIT if it holds a value the reader hasn't claimed yet
    middle: AtomicU8,
}

// Safety: the writer owns its back slot, the reader owns its front slot, and the middle slot is
// only touched by whoever just swapped it out of `middle` with acquire-release ordering.
unsafe impl<T: Send> Send for Shared<T> {}
unsafe impl<T: Send> Sync for Shared<T> {}

/// Creates a triple buffer for handing the latest value from one thread to another.
/// Neither side ever waits; the reader always sees the most recently published value.
pub fn triple_buffer<T: Clone>(initial: T) -> (TripleWriter<T>, TripleReader<T>) {
    let shared = Arc::new(Shared {
        slots: [
            UnsafeCell::new(initial.clone()),
            UnsafeCell::new(initial.clone()),
            UnsafeCell::new(initial),
        ],
        middle: AtomicU8::new(1),
    });

    (
        TripleWriter {
            shared: shared.clone(),
            back: 2,
        },
        TripleReader { shared, front: 0 },
    )
}

pub struct TripleWriter<T> {
    shared: Arc<Shared<T>>,
    back: u8,
}

impl<T> TripleWriter<T> {
    /// Publishes a new value, replacing any value the reader hasn't picked up yet.
    pub fn write(&mut self, value: T) {
        // Safety: the back slot is exclusively owned by the writer
        unsafe { *self.shared.slots[self.back as usize].get() = value };
        self.publish();
    }

    fn publish(&mut self) {
        let previous = self
            .shared
            .middle
            .swap(self.back | DIRTY_BIT, Ordering::AcqRel);
        self.back = previous & INDEX_MASK;
    }
}

pub struct TripleReader<T> {
    shared: Arc<Shared<T>>,
    front: u8,
}

impl<T> TripleReader<T> {
    pub fn has_update(&self) -> bool {
        self.shared.middle.load(Ordering::Relaxed) & DIRTY_BIT != 0
    }

    /// Returns the latest published value, claiming it first if a newer one is available.
    pub fn read(&mut self) -> &T {
        if self.has_update() {
            let previous = self.shared.middle.swap(self.front, Ordering::AcqRel);
            self.front = previous & INDEX_MASK;
        }

        // Safety: the front slot is exclusively owned by the reader
        unsafe { &*self.shared.slots[self.front as usize].get() }
    }
}
