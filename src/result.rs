//! Round outcomes and payout multipliers.

use core::fmt;

use num_bigint::BigInt;

use crate::hand::{BLACKJACK, Hand};

/// Cards needed for a five-card Charlie.
pub const CHARLIE_CARDS: usize = 5;

/// Result of a round from the player's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Player wins.
    Win,
    /// Player loses.
    Lose,
    /// Tie; nothing changes hands.
    Push,
}

/// An exact payout ratio applied to the bet.
///
/// Settlement is `bet * numer / denom`, truncated toward zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Multiplier {
    numer: i32,
    denom: u32,
}

impl Multiplier {
    /// Full loss of the bet.
    pub const LOSS: Self = Self::new(-1, 1);
    /// Bet returned.
    pub const PUSH: Self = Self::new(0, 1);
    /// Even money.
    pub const EVEN: Self = Self::new(1, 1);
    /// Blackjack or Charlie, 3 to 2.
    pub const THREE_TO_TWO: Self = Self::new(3, 2);
    /// Natural blackjack on the opening deal, 2 to 1.
    pub const NATURAL: Self = Self::new(2, 1);

    /// `denom` must not be zero, so only the constants above are public.
    const fn new(numer: i32, denom: u32) -> Self {
        Self { numer, denom }
    }

    /// Numerator.
    #[must_use]
    pub const fn numer(self) -> i32 {
        self.numer
    }

    /// Denominator.
    #[must_use]
    pub const fn denom(self) -> u32 {
        self.denom
    }

    /// Balance change for `bet`, truncated toward zero.
    #[must_use]
    pub fn apply(self, bet: &BigInt) -> BigInt {
        bet * BigInt::from(self.numer) / BigInt::from(self.denom)
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denom == 1 {
            write!(f, "{}x", self.numer)
        } else {
            write!(f, "{}/{}x", self.numer, self.denom)
        }
    }
}

/// A verdict together with the multiplier used to settle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Outcome {
    /// Who won.
    pub verdict: Verdict,
    /// How the bet is settled.
    pub multiplier: Multiplier,
}

impl Outcome {
    /// Player wins at `multiplier`.
    #[must_use]
    pub const fn win(multiplier: Multiplier) -> Self {
        Self {
            verdict: Verdict::Win,
            multiplier,
        }
    }

    /// Player loses the full bet.
    #[must_use]
    pub const fn lose() -> Self {
        Self {
            verdict: Verdict::Lose,
            multiplier: Multiplier::LOSS,
        }
    }

    /// Push.
    #[must_use]
    pub const fn push() -> Self {
        Self {
            verdict: Verdict::Push,
            multiplier: Multiplier::PUSH,
        }
    }

    /// Balance change for `bet`.
    #[must_use]
    pub fn delta(&self, bet: &BigInt) -> BigInt {
        self.multiplier.apply(bet)
    }
}

fn is_twenty_one_or_charlie(hand: &Hand) -> bool {
    hand.total() == BLACKJACK || hand.is_charlie(CHARLIE_CARDS)
}

/// Compares the player's hand to the dealer's.
///
/// Rules apply in order: double bust pushes, player bust loses, a dealer 21
/// or Charlie beats everything but a player 21 or Charlie (which pushes),
/// a player 21 or Charlie pays 3 to 2, then plain comparison with a dealer
/// bust paying even money.
#[must_use]
pub fn resolve(player: &Hand, dealer: &Hand) -> Outcome {
    let player_total = player.total();
    let dealer_total = dealer.total();

    if player_total > BLACKJACK && dealer_total > BLACKJACK {
        return Outcome::push();
    }
    if player_total > BLACKJACK {
        return Outcome::lose();
    }
    if is_twenty_one_or_charlie(dealer) {
        return if is_twenty_one_or_charlie(player) {
            Outcome::push()
        } else {
            Outcome::lose()
        };
    }
    if is_twenty_one_or_charlie(player) {
        return Outcome::win(Multiplier::THREE_TO_TWO);
    }
    if player_total > dealer_total || dealer_total > BLACKJACK {
        return Outcome::win(Multiplier::EVEN);
    }
    if player_total == dealer_total {
        return Outcome::push();
    }
    Outcome::lose()
}
