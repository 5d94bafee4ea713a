//! Point-budget selection.
//!
//! Walks candidates in priority order and takes each one while it still
//! fits the remaining points. Stops for good at the first candidate that
//! does not fit: cheaper items further down are never considered.

use crate::types::ScoredCandidate;

/// Anything with an entry cost in points.
pub trait Costed {
    fn cost(&self) -> u32;
}

impl Costed for ScoredCandidate {
    fn cost(&self) -> u32 {
        self.candidate.cost
    }
}

/// Iterator over the affordable prefix of a candidate list.
///
/// Deterministic and restartable: cloning it, or calling [`affordable`]
/// again on the same input, yields the same sequence.
#[derive(Debug)]
pub struct Affordable<'a, T> {
    items: std::slice::Iter<'a, T>,
    remaining: u32,
    stopped: bool,
}

// Manual impl: cloning only copies the position, so `T` need not be `Clone`.
impl<T> Clone for Affordable<'_, T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            remaining: self.remaining,
            stopped: self.stopped,
        }
    }
}

impl<'a, T> Affordable<'a, T> {
    /// Points left after the items yielded so far.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

impl<'a, T: Costed> Iterator for Affordable<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stopped {
            return None;
        }
        let item = self.items.next()?;
        if item.cost() <= self.remaining {
            self.remaining -= item.cost();
            Some(item)
        } else {
            self.stopped = true;
            None
        }
    }
}

/// Greedy, order-preserving, early-stopping selection under `budget`.
pub fn affordable<T: Costed>(candidates: &[T], budget: u32) -> Affordable<'_, T> {
    Affordable {
        items: candidates.iter(),
        remaining: budget,
        stopped: false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
