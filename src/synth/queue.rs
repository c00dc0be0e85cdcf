use crate::synth::event::Event;

/// Time-ordered pending events, pre-sized so inserts never allocate.
///
/// Events are insertion-sorted on arrival by `(time, kind)`; events with
/// equal keys keep their arrival order. Once full, further events are
/// dropped.
pub struct EventQueue {
    events: Vec<Event>,
    capacity: usize,
}

impl EventQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert in time order. Returns `false` and drops the event when full.
    pub fn insert(&mut self, event: Event) -> bool {
        if self.events.len() >= self.capacity {
            return false;
        }
        let key = event.order_key();
        let at = self.events.partition_point(|e| e.order_key() <= key);
        self.events.insert(at, event);
        true
    }

    /// Number of queued events with `time < end`. They form a prefix.
    pub fn count_before(&self, end: usize) -> usize {
        self.events.partition_point(|e| e.time < end)
    }

    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    /// Drop the first `count` events.
    pub fn consume(&mut self, count: usize) {
        let count = count.min(self.events.len());
        self.events.drain(..count);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }
}
