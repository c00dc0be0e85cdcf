/// Physical keys (MIDI) or channels (MPE) tracked by the engine.
pub const MAX_PHYSICAL_KEYS: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyState {
    #[default]
    Off,
    On,
    /// Released while the sustain pedal was down.
    Sustained,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KeyEntry {
    pub state: KeyState,
    pub pitch: f32,
    pub velocity: f32,
    /// Order of the most recent note-on for this key; higher is newer.
    pub note_on_sequence: u32,
}

/// Bookkeeping per physical key or MPE channel.
///
/// Keys are numbered `1..=MAX_PHYSICAL_KEYS`; 0 is reserved for "no key"
/// and out-of-range indices are clamped. Only the engine's event handlers
/// mutate the table.
pub struct KeyStateTable {
    entries: [KeyEntry; MAX_PHYSICAL_KEYS + 1],
    sequence: u32,
}

impl KeyStateTable {
    pub fn new() -> Self {
        Self {
            entries: [KeyEntry::default(); MAX_PHYSICAL_KEYS + 1],
            sequence: 0,
        }
    }

    #[inline]
    pub fn clamp_key(key: usize) -> usize {
        key.clamp(1, MAX_PHYSICAL_KEYS)
    }

    pub fn get(&self, key: usize) -> &KeyEntry {
        &self.entries[Self::clamp_key(key)]
    }

    pub fn state(&self, key: usize) -> KeyState {
        self.get(key).state
    }

    pub fn note_on(&mut self, key: usize, pitch: f32, velocity: f32) {
        self.sequence = self.sequence.wrapping_add(1);
        let entry = &mut self.entries[Self::clamp_key(key)];
        entry.state = KeyState::On;
        entry.pitch = pitch;
        entry.velocity = velocity;
        entry.note_on_sequence = self.sequence;
    }

    /// Key released: `Sustained` if the pedal is down, otherwise `Off`.
    pub fn release(&mut self, key: usize, pedal_down: bool) -> KeyState {
        let entry = &mut self.entries[Self::clamp_key(key)];
        entry.state = if pedal_down {
            KeyState::Sustained
        } else {
            KeyState::Off
        };
        entry.state
    }

    /// Turn every sustained key off.
    pub fn release_sustained(&mut self) {
        for entry in self.entries.iter_mut() {
            if entry.state == KeyState::Sustained {
                entry.state = KeyState::Off;
            }
        }
    }

    pub fn held_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.state == KeyState::On)
            .count()
    }

    /// The most recently pressed key that is still held, ignoring `except`.
    pub fn most_recent_held(&self, except: usize) -> Option<usize> {
        self.most_recent_held_where(|key| key != except)
    }

    /// The most recently pressed held key among those `keep` accepts.
    pub fn most_recent_held_where(&self, mut keep: impl FnMut(usize) -> bool) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .skip(1)
            .filter(|&(key, e)| e.state == KeyState::On && keep(key))
            .max_by_key(|(_, e)| e.note_on_sequence)
            .map(|(key, _)| key)
    }

    pub fn clear(&mut self) {
        self.entries = [KeyEntry::default(); MAX_PHYSICAL_KEYS + 1];
        self.sequence = 0;
    }
}

impl Default for KeyStateTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_respects_pedal() {
        let mut keys = KeyStateTable::new();
        keys.note_on(60, 60.0, 1.0);
        assert_eq!(keys.release(60, true), KeyState::Sustained);
        keys.release_sustained();
        assert_eq!(keys.state(60), KeyState::Off);
    }

    #[test]
    fn most_recent_held_uses_note_on_order() {
        let mut keys = KeyStateTable::new();
        keys.note_on(64, 64.0, 1.0);
        keys.note_on(60, 60.0, 1.0);
        keys.note_on(67, 67.0, 1.0);
        keys.release(67, false);

        assert_eq!(keys.most_recent_held(0), Some(60));
        assert_eq!(keys.most_recent_held(60), Some(64));
        assert_eq!(keys.held_count(), 2);
    }

    #[test]
    fn filtered_lookup_skips_rejected_keys() {
        let mut keys = KeyStateTable::new();
        keys.note_on(48, 48.0, 0.5);
        keys.note_on(52, 52.0, 0.7);
        keys.note_on(55, 55.0, 0.9);

        assert_eq!(keys.most_recent_held_where(|k| k != 55 && k != 52), Some(48));
        assert_eq!(keys.get(48).velocity, 0.5);
        assert_eq!(keys.most_recent_held_where(|_| false), None);
    }

    #[test]
    fn out_of_range_keys_are_clamped() {
        let mut keys = KeyStateTable::new();
        keys.note_on(500, 1.0, 1.0);
        assert_eq!(keys.state(MAX_PHYSICAL_KEYS), KeyState::On);
        keys.note_on(0, 1.0, 1.0);
        assert_eq!(keys.state(1), KeyState::On);
    }
}
