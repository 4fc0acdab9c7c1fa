//! Prize assignment
//!
//! Turns an ordered prize list into a random bijection from box number to
//! prize. The list is padded from a fallback pool or truncated so that it
//! holds exactly one prize per box, then zipped with a Fisher-Yates
//! permutation of the box numbers.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::prize::Prize;

/// Reasons an assignment cannot be built
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignError {
    #[error("a board needs at least one box")]
    NoBoxes,
    #[error("{missing} prize(s) short of {box_count} boxes and the fallback pool is empty")]
    EmptyFallback { missing: usize, box_count: u32 },
}

/// Box number (1-based) to prize, fixed for one round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    boxes: BTreeMap<u32, Prize>,
    /// Prizes cut off the end of the input list
    truncated: usize,
    /// Fallback prizes appended to the input list
    padded: usize,
}

impl Assignment {
    pub fn get(&self, box_id: u32) -> Option<&Prize> {
        self.boxes.get(&box_id)
    }

    pub fn contains(&self, box_id: u32) -> bool {
        self.boxes.contains_key(&box_id)
    }

    /// Number of boxes on the board
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Box ids in ascending order
    pub fn box_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.boxes.keys().copied()
    }

    /// (box id, prize) pairs in ascending box order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Prize)> + '_ {
        self.boxes.iter().map(|(id, prize)| (*id, prize))
    }

    pub fn truncated(&self) -> usize {
        self.truncated
    }

    pub fn padded(&self) -> usize {
        self.padded
    }
}

/// Unbiased in-place shuffle: for i from the last index down to 1, swap
/// with a uniformly chosen index in [0, i].
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Owns the RNG used for padding and shuffling.
///
/// Every call to [`PrizeAssigner::assign`] builds a brand new
/// [`Assignment`]; nothing is carried between calls except RNG state.
#[derive(Debug, Clone)]
pub struct PrizeAssigner {
    seed: u64,
    rng: Pcg32,
}

impl PrizeAssigner {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Assigner seeded from the platform entropy source
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Build a fresh assignment of `prizes` onto boxes `1..=box_count`.
    ///
    /// Short lists are padded with prizes drawn uniformly (with replacement)
    /// from `fallback`, stopping exactly at `box_count`. Long lists keep
    /// only their first `box_count` entries; the cut is logged and reported
    /// through [`Assignment::truncated`].
    pub fn assign(
        &mut self,
        prizes: &[Prize],
        box_count: u32,
        fallback: &[Prize],
    ) -> Result<Assignment, AssignError> {
        if box_count == 0 {
            return Err(AssignError::NoBoxes);
        }
        let target = box_count as usize;

        let mut pool: Vec<Prize> = prizes.iter().take(target).cloned().collect();
        let truncated = prizes.len().saturating_sub(target);
        if truncated > 0 {
            log::warn!(
                "{} prize(s) dropped: only {} boxes on the board",
                truncated,
                box_count
            );
        }

        let padded = target - pool.len();
        if padded > 0 {
            if fallback.is_empty() {
                return Err(AssignError::EmptyFallback {
                    missing: padded,
                    box_count,
                });
            }
            while pool.len() < target {
                let pick = self.rng.random_range(0..fallback.len());
                pool.push(fallback[pick].clone());
            }
            log::debug!("Padded prize list with {} fallback prize(s)", padded);
        }

        let mut box_numbers: Vec<u32> = (1..=box_count).collect();
        shuffle(&mut box_numbers, &mut self.rng);

        let boxes = box_numbers.into_iter().zip(pool).collect();
        Ok(Assignment {
            boxes,
            truncated,
            padded,
        })
    }
}
