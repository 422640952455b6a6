//! The multi-deck shoe.

use alloc::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::card::{RANK_COUNT, Rank};
use crate::error::InvariantViolation;

/// Copies of each rank in an eight-deck shoe (8 decks x 4 suits).
pub const DEFAULT_COPIES_PER_RANK: u16 = 32;

/// A finite shoe tracked as a remaining count per rank.
///
/// Draws pick a rank uniformly among all thirteen and retry when the picked
/// rank is depleted, so draws are not weighted by remaining count.
#[derive(Debug, Clone)]
pub struct Deck {
    remaining: [u16; RANK_COUNT],
    capacity: u32,
    drawn: u32,
    stacked: VecDeque<Rank>,
    rng: ChaCha8Rng,
}

impl Deck {
    /// Creates a full shoe with `copies` of every rank.
    #[must_use]
    pub fn new(copies: u16, seed: u64) -> Self {
        Self {
            remaining: [copies; RANK_COUNT],
            capacity: u32::from(copies) * RANK_COUNT as u32,
            drawn: 0,
            stacked: VecDeque::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Creates a full shoe whose first draws are `ranks`, in order.
    ///
    /// Stacked cards are still taken out of the shoe's counts. A stacked rank
    /// that is already depleted falls back to a random draw.
    #[must_use]
    pub fn stacked(copies: u16, seed: u64, ranks: &[Rank]) -> Self {
        let mut deck = Self::new(copies, seed);
        deck.stacked.extend(ranks.iter().copied());
        deck
    }

    /// Draws one card.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation::DeckExhausted`] once every card is out.
    pub fn draw(&mut self) -> Result<Rank, InvariantViolation> {
        if self.remaining_total() == 0 {
            return Err(InvariantViolation::DeckExhausted);
        }

        while let Some(rank) = self.stacked.pop_front() {
            if self.remaining[rank.index()] > 0 {
                return Ok(self.take(rank));
            }
        }

        loop {
            let index = self.rng.random_range(0..RANK_COUNT);
            if self.remaining[index] > 0 {
                // index is always below RANK_COUNT here
                if let Some(rank) = Rank::from_index(index) {
                    return Ok(self.take(rank));
                }
            }
        }
    }

    fn take(&mut self, rank: Rank) -> Rank {
        self.remaining[rank.index()] -= 1;
        self.drawn += 1;
        rank
    }

    /// Returns a previously drawn card to the shoe.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation::DeckOverfilled`] if the shoe already holds
    /// every copy of `rank`, which means the card was never drawn from it.
    pub fn put_back(&mut self, rank: Rank) -> Result<(), InvariantViolation> {
        let per_rank = self.capacity / RANK_COUNT as u32;
        if u32::from(self.remaining[rank.index()]) >= per_rank || self.drawn == 0 {
            return Err(InvariantViolation::DeckOverfilled);
        }
        self.remaining[rank.index()] += 1;
        self.drawn -= 1;
        Ok(())
    }

    /// Copies of `rank` still in the shoe.
    #[must_use]
    pub const fn remaining(&self, rank: Rank) -> u16 {
        self.remaining[rank.index()]
    }

    /// Cards still in the shoe.
    #[must_use]
    pub fn remaining_total(&self) -> u32 {
        self.remaining.iter().map(|&n| u32::from(n)).sum()
    }

    /// Cards currently out of the shoe.
    #[must_use]
    pub const fn drawn(&self) -> u32 {
        self.drawn
    }

    /// Size of the full shoe.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }
}
