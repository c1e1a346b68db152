// Fixed-capacity ring of the most recent values; oldest entries overwritten.

#[derive(Debug)]
pub struct CircularBuffer<T> {
    items: Vec<T>,
    capacity: usize,
    // Oldest slot once the buffer is full; next overwrite target.
    head: usize,
}

impl<T> CircularBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
            head: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// O(1) insert; once full, overwrites the oldest slot.
    pub fn push(&mut self, item: T) {
        if self.items.len() < self.capacity {
            self.items.push(item);
        } else {
            self.items[self.head] = item;
            self.head = (self.head + 1) % self.capacity;
        }
    }
}

impl<T: Clone> CircularBuffer<T> {
    /// Snapshot in chronological (oldest-to-newest) order regardless of the
    /// internal wrap position.
    pub fn to_vec(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.items.len());
        if self.items.len() < self.capacity {
            out.extend_from_slice(&self.items);
        } else {
            out.extend_from_slice(&self.items[self.head..]);
            out.extend_from_slice(&self.items[..self.head]);
        }
        out
    }
}
