//! Deterministic random source for die rolls and board setup.
//!
//! The authoritative engine runs a seeded xorshift64 generator, so a whole
//! game is reproducible from its seed. Remote replicas never see the seed;
//! they run a scripted source instead, fed with the roll values the
//! authority already produced.

// Die rolls intentionally go through f64 so setup draws and rolls share one stream
#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]

use std::collections::VecDeque;

use crate::error::{TussleError, TussleResult};

/// Deterministic random source, either seeded or scripted.
#[derive(Debug, Clone)]
pub struct RandomSource {
    state: u64,
    script: Option<VecDeque<u32>>,
}

impl RandomSource {
    /// Create a seeded generator (xorshift64).
    #[must_use]
    pub const fn seeded(seed: u64) -> Self {
        // Zero state would be a fixed point
        let state = if seed == 0 { 0x5555_5555_5555_5555 } else { seed };
        Self {
            state,
            script: None,
        }
    }

    /// Create a scripted source that replays the given roll values in order.
    #[must_use]
    pub fn scripted<I: IntoIterator<Item = u32>>(rolls: I) -> Self {
        Self {
            state: 0x5555_5555_5555_5555,
            script: Some(rolls.into_iter().collect()),
        }
    }

    /// Whether this source replays scripted rolls instead of generating them.
    #[must_use]
    pub fn is_scripted(&self) -> bool {
        self.script.is_some()
    }

    /// Append a roll value to a scripted source's queue.
    ///
    /// No effect on seeded sources.
    pub fn push_roll(&mut self, value: u32) {
        if let Some(script) = &mut self.script {
            script.push_back(value);
        }
    }

    /// Generate the next raw u64.
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generate a random f64 in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Roll a die with the given number of sides, returning `1..=sides`.
    ///
    /// # Errors
    ///
    /// Returns `RollLogExhausted` if this is a scripted source and the
    /// queue is empty.
    pub fn roll_die(&mut self, sides: u32) -> TussleResult<u32> {
        if let Some(script) = &mut self.script {
            return script.pop_front().ok_or(TussleError::RollLogExhausted);
        }
        Ok((self.next_f64() * f64::from(sides)) as u32 + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_is_deterministic() {
        let mut a = RandomSource::seeded(42);
        let mut b = RandomSource::seeded(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_zero_seed_is_remapped() {
        let mut rng = RandomSource::seeded(0);
        assert_ne!(rng.next_u64(), 0);
    }

    #[test]
    fn test_roll_die_in_range() {
        let mut rng = RandomSource::seeded(7);
        for _ in 0..1000 {
            let roll = rng.roll_die(6).unwrap();
            assert!((1..=6).contains(&roll));
        }
        for _ in 0..1000 {
            let roll = rng.roll_die(10).unwrap();
            assert!((1..=10).contains(&roll));
        }
    }

    #[test]
    fn test_roll_die_covers_all_faces() {
        let mut rng = RandomSource::seeded(99);
        let mut seen = [false; 6];
        for _ in 0..1000 {
            let roll = rng.roll_die(6).unwrap() as usize;
            seen[roll - 1] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_scripted_replays_in_order() {
        let mut rng = RandomSource::scripted([3, 6, 10]);
        assert_eq!(rng.roll_die(6).unwrap(), 3);
        assert_eq!(rng.roll_die(6).unwrap(), 6);
        assert_eq!(rng.roll_die(10).unwrap(), 10);
        assert_eq!(rng.roll_die(10), Err(TussleError::RollLogExhausted));
    }

    #[test]
    fn test_push_roll_extends_script() {
        let mut rng = RandomSource::scripted([1]);
        rng.push_roll(4);
        assert_eq!(rng.roll_die(6).unwrap(), 1);
        assert_eq!(rng.roll_die(6).unwrap(), 4);
    }

    #[test]
    fn test_next_f64_in_unit_interval() {
        let mut rng = RandomSource::seeded(1234);
        for _ in 0..1000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }
}
