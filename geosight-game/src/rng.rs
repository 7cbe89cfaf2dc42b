//! Deterministic RNG streams segregated by game domain.
//!
//! Selection, jitter, and shuffling draw from independent streams so one
//! domain consuming randomness never shifts another's sequence for the
//! same seed.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use sha2::Sha256;
use std::cell::{RefCell, RefMut};

/// Bundle of per-domain RNG streams derived from one user-visible seed.
#[derive(Debug, Clone)]
pub struct RngBundle {
    select: RefCell<CountingRng<SmallRng>>,
    jitter: RefCell<CountingRng<SmallRng>>,
    shuffle: RefCell<CountingRng<SmallRng>>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            select: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"select"))),
            jitter: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"jitter"))),
            shuffle: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"shuffle"))),
        }
    }

    /// Stream used for drawing the round's target city.
    #[must_use]
    pub fn select(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.select.borrow_mut()
    }

    /// Stream used for coordinate jitter.
    #[must_use]
    pub fn jitter(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.jitter.borrow_mut()
    }

    /// Stream used for distractor sampling and option shuffling.
    #[must_use]
    pub fn shuffle(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.shuffle.borrow_mut()
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: rand::RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()).expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let seed_bytes: [u8; 8] = digest[..8].try_into().expect("digest slice length");
    u64::from_le_bytes(seed_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn streams_are_deterministic_per_seed() {
        let a = RngBundle::from_user_seed(42);
        let b = RngBundle::from_user_seed(42);
        let draw_a: u32 = a.select().gen_range(0..1_000_000);
        let draw_b: u32 = b.select().gen_range(0..1_000_000);
        assert_eq!(draw_a, draw_b);
    }

    #[test]
    fn streams_are_independent_across_domains() {
        let bundle = RngBundle::from_user_seed(42);
        let select: u32 = bundle.select().gen_range(0..1_000_000);
        let shuffle: u32 = bundle.shuffle().gen_range(0..1_000_000);
        // not a strict guarantee, but a stable regression check for the
        // domain separation tags
        assert_ne!(select, shuffle);
    }

    #[test]
    fn draws_are_counted() {
        let bundle = RngBundle::from_user_seed(7);
        assert_eq!(bundle.jitter().draws(), 0);
        let _ = bundle.jitter().gen_range(0.0_f64..1.0);
        assert!(bundle.jitter().draws() >= 1);
    }
}
