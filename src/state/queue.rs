use std::collections::VecDeque;

/// Fixed-capacity FIFO of the most recent samples; pushing into a full queue evicts the oldest.
#[derive(Debug, Clone)]
pub struct SampleQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> SampleQueue<T> {
    /// Create an empty queue holding at most `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest one when full.
    pub fn push(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// Number of held samples.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no sample is held.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether exactly `capacity` samples are held.
    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    /// Drop every sample.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Oldest held sample.
    pub fn oldest(&self) -> Option<&T> {
        self.items.front()
    }

    /// Most recent sample.
    pub fn newest(&self) -> Option<&T> {
        self.items.back()
    }
}

impl SampleQueue<f64> {
    /// Arithmetic mean of the held samples, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.items.iter().sum::<f64>() / self.items.len() as f64)
    }
}
