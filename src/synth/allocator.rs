use crate::synth::voice::Voice;

/*
Voice Allocation
================

When a note arrives and its key doesn't already own a voice, one has to be
picked from the playable voices `1..=polyphony` (voice 0 belongs to the MPE
main channel and is never handed out).

  free search   Round robin. Start just after the last free voice we found
                and take the first voice with no owner. Spreads notes across
                voices so a release tail on one isn't cut by the next note.

  stealing      Nothing free. Take the voice whose owning key is nearest the
                new key; on a tie, the lowest voice index. A nearby key is
                the least audible thing to cut.
*/

/// Round-robin free voice search over `voices[1..=polyphony]`, starting after
/// `last_free`. Returns the voice index and remembers it in `last_free`.
pub fn find_free_voice(voices: &[Voice], polyphony: usize, last_free: &mut usize) -> Option<usize> {
    if polyphony == 0 {
        return None;
    }
    let start = if *last_free > polyphony { 0 } else { *last_free };
    let found = (0..polyphony)
        .map(|i| (start + i) % polyphony + 1)
        .find(|&v| voices.get(v).is_some_and(Voice::is_free))?;
    *last_free = found;
    Some(found)
}

/// The playable voice whose creator key is nearest `key`, ties to the lowest
/// voice index.
pub fn find_nearest_voice(voices: &[Voice], polyphony: usize, key: usize) -> Option<usize> {
    voices
        .iter()
        .enumerate()
        .skip(1)
        .take(polyphony)
        .min_by_key(|(_, v)| v.creator_key().abs_diff(key))
        .map(|(i, _)| i)
}
