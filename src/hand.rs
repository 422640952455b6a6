//! Hands and hand evaluation.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::card::Rank;

/// Hand total above which a hand is bust.
pub const BLACKJACK: u8 = 21;

fn evaluate_cards(cards: &[Rank]) -> (u8, bool) {
    let mut value: u8 = 0;
    let mut aces: u8 = 0;

    for card in cards {
        if *card == Rank::Ace {
            aces += 1;
        }
        value = value.saturating_add(card.value());
    }

    while value > BLACKJACK && aces > 0 {
        value -= 10;
        aces -= 1;
    }

    let is_soft = aces > 0 && value <= BLACKJACK;
    (value, is_soft)
}

/// An append-only sequence of cards held by the player or the dealer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<Rank>,
}

impl Hand {
    /// Creates an empty hand.
    #[must_use]
    pub const fn new() -> Self {
        Self { cards: Vec::new() }
    }

    /// Creates a hand holding `cards`.
    #[must_use]
    pub fn from_cards(cards: &[Rank]) -> Self {
        Self {
            cards: cards.to_vec(),
        }
    }

    /// Adds a card to the hand.
    pub fn add_card(&mut self, card: Rank) {
        self.cards.push(card);
    }

    /// Removes the most recent card. Only used to undo the dealer's pre-deal 21.
    pub(crate) fn pop_card(&mut self) -> Option<Rank> {
        self.cards.pop()
    }

    /// Returns the cards in the hand.
    #[must_use]
    pub fn cards(&self) -> &[Rank] {
        &self.cards
    }

    /// Calculates the point total.
    ///
    /// Aces count 11 and are demoted to 1, one at a time, while the total is
    /// over 21.
    #[must_use]
    pub fn total(&self) -> u8 {
        evaluate_cards(&self.cards).0
    }

    /// Returns whether an ace is still counted as 11.
    #[must_use]
    pub fn is_soft(&self) -> bool {
        evaluate_cards(&self.cards).1
    }

    /// Returns whether the hand is over 21.
    #[must_use]
    pub fn is_bust(&self) -> bool {
        self.total() > BLACKJACK
    }

    /// Returns whether the hand holds at least `cards` cards without busting.
    #[must_use]
    pub fn is_charlie(&self, cards: usize) -> bool {
        self.cards.len() >= cards && !self.is_bust()
    }

    /// Returns whether this is a two-card 21.
    #[must_use]
    pub fn is_natural(&self) -> bool {
        self.cards.len() == 2 && self.total() == BLACKJACK
    }

    /// Returns the number of cards in the hand.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Returns whether the hand is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Card labels and total, for display.
    #[must_use]
    pub fn render(&self) -> RenderedHand {
        RenderedHand {
            labels: self.cards.iter().map(|c| c.label()).collect(),
            total: self.total(),
        }
    }
}

/// A hand prepared for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedHand {
    /// Card labels in the order they were dealt.
    pub labels: Vec<&'static str>,
    /// Point total.
    pub total: u8,
}

impl RenderedHand {
    /// Formats as `"A, K (21)"`.
    #[must_use]
    pub fn line(&self) -> String {
        alloc::format!("{} ({})", self.labels.join(", "), self.total)
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render().line())
    }
}
