#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::synth::event::Event;

/// Something the processing thread can pull events from without blocking.
///
/// Decoding threads push into a bounded lock-free transport; the processing
/// thread drains it into the engine right before each block, so the engine's
/// queue is only ever touched from one thread.
pub trait EventSource {
    fn pop(&mut self) -> Option<Event>;
}

#[cfg(feature = "rtrb")]
impl EventSource for Consumer<Event> {
    fn pop(&mut self) -> Option<Event> {
        Consumer::pop(self).ok()
    }
}

/// Front to back. Handy for offline rendering and tests.
impl EventSource for std::collections::VecDeque<Event> {
    fn pop(&mut self) -> Option<Event> {
        self.pop_front()
    }
}

#[cfg(all(test, feature = "rtrb"))]
mod tests {
    use super::*;
    use rtrb::RingBuffer;

    #[test]
    fn consumer_pops_in_push_order() {
        let (mut tx, mut rx) = RingBuffer::<Event>::new(4);
        tx.push(Event::pitch_wheel(1, 0, 0.25)).unwrap();
        tx.push(Event::pitch_wheel(1, 1, 0.5)).unwrap();

        assert_eq!(EventSource::pop(&mut rx).map(|e| e.value1), Some(0.25));
        assert_eq!(EventSource::pop(&mut rx).map(|e| e.value1), Some(0.5));
        assert!(EventSource::pop(&mut rx).is_none());
    }
}
