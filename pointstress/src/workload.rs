//! Randomized transfer generation between the two fixed participants.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// One point transfer between the two participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// The participant the points are taken from.
    pub from: String,
    /// The participant the points are credited to.
    pub to: String,
    /// The transferred amount.
    pub point: i64,
}

/// Generates transfers with uniformly random direction and payload.
///
/// Every draw is independent; a retried attempt gets a brand new
/// transfer rather than a replay of the failed one.
#[derive(Debug)]
pub struct Workload {
    participants: [String; 2],
    max_point: i64,

    /// The RNG driving direction and payload draws.
    rng: SmallRng,
}

impl Workload {
    /// Creates a workload over the two given participants, with
    /// payloads drawn uniformly from `0..max_point`.
    pub fn new(participants: [String; 2], max_point: i64) -> Self {
        Self::seeded(participants, max_point, rand::random())
    }

    fn seeded(participants: [String; 2], max_point: i64, seed: u64) -> Self {
        Self {
            participants,
            max_point,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Draws a fresh transfer.
    ///
    /// Direction is a fair coin flip between the two participants, so
    /// the source and destination always differ.
    pub fn next_transfer(&mut self) -> Transfer {
        let from = self.rng.random_range(0..2usize);
        let to = 1 - from;

        Transfer {
            from: self.participants[from].clone(),
            to: self.participants[to].clone(),
            point: self.rng.random_range(0..self.max_point),
        }
    }
}
