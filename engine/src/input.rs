//! # Input
//!
//! Scenes never poll the keyboard themselves. The render loop samples which [`Key`]s are held once per frame and hands the update loop an [`InputState`] snapshot, so every object sees the same keys for a whole tick.

use std::collections::HashSet;

/// The keys the machine reacts to. The display decides which physical key each one is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// move the carriage left, or page back in the gallery
    Left,
    /// move the carriage right, or page forward in the gallery
    Right,
    /// insert a coin and drop the claw
    Drop,
    /// pull the claw back up
    Rise,
    /// close the claw arms
    Clench,
    /// switch between the machine and the gallery
    Toggle,
    /// rebuild the machine from scratch
    Reset,
}

/// Which keys are held down right now.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    held: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: Key) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn held(&self) -> impl Iterator<Item = Key> + '_ {
        self.held.iter().copied()
    }
}

impl FromIterator<Key> for InputState {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self {
            held: iter.into_iter().collect(),
        }
    }
}

/// Accepts a held key at most once per cooldown.
///
/// Held-key snapshots have no notion of a key going down, so toggles remember when they last fired instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Debounce {
    cooldown: f64,
    last: Option<f64>,
}

impl Debounce {
    pub fn new(cooldown: f64) -> Self {
        Self {
            cooldown,
            last: None,
        }
    }

    /// `true` (and restarts the cooldown) if more than `cooldown` seconds have passed since the last accepted press
    pub fn ready(&mut self, now: f64) -> bool {
        match self.last {
            Some(last) if now - last <= self.cooldown => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    /// shorthand for "this key is held and the cooldown has passed"
    pub fn pressed(&mut self, input: &InputState, key: Key, now: f64) -> bool {
        input.is_held(key) && self.ready(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release() {
        let mut input = InputState::new();
        input.press(Key::Drop);
        input.press(Key::Left);
        assert!(input.is_held(Key::Drop));
        assert!(input.is_held(Key::Left));
        assert!(!input.is_held(Key::Rise));

        input.release(Key::Drop);
        assert!(!input.is_held(Key::Drop));
        assert_eq!(input.held().collect::<Vec<_>>(), vec![Key::Left]);
    }

    #[test]
    fn collects_from_keys() {
        let input: InputState = [Key::Toggle, Key::Reset].into_iter().collect();
        assert!(input.is_held(Key::Toggle));
        assert!(input.is_held(Key::Reset));
        assert!(!input.is_held(Key::Clench));
    }

    #[test]
    fn debounce_waits_out_cooldown() {
        let mut debounce = Debounce::new(0.25);
        assert!(debounce.ready(0.0));
        assert!(!debounce.ready(0.1));
        assert!(!debounce.ready(0.25));
        assert!(debounce.ready(0.26));
        assert!(!debounce.ready(0.3));
    }

    #[test]
    fn debounce_ignores_released_keys() {
        let mut debounce = Debounce::new(0.25);
        let idle = InputState::new();
        let toggling: InputState = [Key::Toggle].into_iter().collect();

        assert!(!debounce.pressed(&idle, Key::Toggle, 0.0));
        // an unheld key doesn't start the cooldown
        assert!(debounce.pressed(&toggling, Key::Toggle, 0.1));
        assert!(!debounce.pressed(&toggling, Key::Toggle, 0.2));
    }
}
