//! One player's round against the house.

use core::time::Duration;

use num_bigint::BigInt;
use tokio::time::Instant;

use crate::deck::Deck;
use crate::error::InvariantViolation;
use crate::hand::{BLACKJACK, Hand};
use crate::id::{MessageHandle, PlayerId};
use crate::render::{FinishKind, SessionView};
use crate::result::{CHARLIE_CARDS, Multiplier, Outcome, resolve};

use super::state::SessionState;

/// Result of one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The round goes on; the player acts again.
    Continue,
    /// The round is over and must be settled.
    Finished {
        /// How it ended.
        kind: FinishKind,
        /// Verdict and multiplier to settle with.
        outcome: Outcome,
    },
}

impl Step {
    fn resolved(outcome: Outcome) -> Self {
        Self::Finished {
            kind: FinishKind::Resolved(outcome.verdict),
            outcome,
        }
    }
}

/// A single blackjack round held by the registry.
///
/// Only the task holding the session's lock mutates it. Once the state is
/// [`SessionState::Terminal`] every transition is refused.
#[derive(Debug)]
pub struct GameSession {
    owner: PlayerId,
    handle: MessageHandle,
    pub(super) deck: Deck,
    pub(super) player: Hand,
    pub(super) dealer: Hand,
    bet: BigInt,
    last_activity: Instant,
    state: SessionState,
    settled: bool,
    pub(super) dealer_hits_through: u8,
}

impl GameSession {
    /// Deals a new round.
    ///
    /// The dealer takes two cards first; a dealer 21 is undone by returning
    /// the second card and drawing again. The player then takes two cards.
    ///
    /// # Errors
    ///
    /// Returns an [`InvariantViolation`] if the shoe runs out.
    pub fn deal(
        owner: PlayerId,
        handle: MessageHandle,
        bet: BigInt,
        deck: Deck,
        dealer_hits_through: u8,
        now: Instant,
    ) -> Result<Self, InvariantViolation> {
        let mut session = Self {
            owner,
            handle,
            deck,
            player: Hand::new(),
            dealer: Hand::new(),
            bet,
            last_activity: now,
            state: SessionState::Dealing,
            settled: false,
            dealer_hits_through,
        };
        session.deal_opening()?;
        Ok(session)
    }

    /// Leaves [`SessionState::Dealing`]: a natural ends the round at once.
    pub fn open(&mut self) -> Step {
        if self.state != SessionState::Dealing {
            return Step::Continue;
        }
        if self.player.is_natural() {
            return Step::Finished {
                kind: FinishKind::Natural,
                outcome: Outcome::win(Multiplier::NATURAL),
            };
        }
        self.state = SessionState::AwaitingAction;
        Step::Continue
    }

    /// Player draws a card; the dealer draws one too while at or under the
    /// house limit.
    ///
    /// # Errors
    ///
    /// Returns an [`InvariantViolation`] if the shoe runs out.
    pub fn hit(&mut self, now: Instant) -> Result<Step, InvariantViolation> {
        self.touch(now);
        let card = self.deck.draw()?;
        self.player.add_card(card);
        if self.dealer_must_draw() {
            let card = self.deck.draw()?;
            self.dealer.add_card(card);
        }

        if self.round_over() {
            Ok(Step::resolved(resolve(&self.player, &self.dealer)))
        } else {
            Ok(Step::Continue)
        }
    }

    /// Dealer plays out and hands are compared.
    ///
    /// # Errors
    ///
    /// Returns an [`InvariantViolation`] if the shoe runs out.
    pub fn stand(&mut self, now: Instant) -> Result<Step, InvariantViolation> {
        self.touch(now);
        self.dealer_play()?;
        Ok(Step::resolved(resolve(&self.player, &self.dealer)))
    }

    /// Player gives up the full bet.
    pub fn forfeit(&mut self, now: Instant) -> Step {
        self.touch(now);
        Step::Finished {
            kind: FinishKind::Forfeit,
            outcome: Outcome::lose(),
        }
    }

    fn round_over(&self) -> bool {
        let ends = |hand: &Hand| hand.total() >= BLACKJACK || hand.is_charlie(CHARLIE_CARDS);
        ends(&self.player) || ends(&self.dealer)
    }

    fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    /// Marks the round settled and terminal.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation::DoubleSettlement`] if it was already settled.
    pub fn mark_settled(&mut self) -> Result<(), InvariantViolation> {
        if self.settled {
            return Err(InvariantViolation::DoubleSettlement);
        }
        self.settled = true;
        self.state = SessionState::Terminal;
        Ok(())
    }

    /// Ends the round without settlement.
    pub fn terminate(&mut self) {
        self.state = SessionState::Terminal;
    }

    /// Returns whether no action arrived for longer than `timeout`.
    #[must_use]
    pub fn is_idle(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_activity) > timeout
    }

    /// Returns whether the round is over.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self.state, SessionState::Terminal)
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns whether money has moved for this round.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.settled
    }

    /// Owner of the round.
    #[must_use]
    pub const fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Message showing the round.
    #[must_use]
    pub const fn handle(&self) -> MessageHandle {
        self.handle
    }

    /// Amount at stake.
    #[must_use]
    pub const fn bet(&self) -> &BigInt {
        &self.bet
    }

    /// The player's hand.
    #[must_use]
    pub const fn player(&self) -> &Hand {
        &self.player
    }

    /// The dealer's hand.
    #[must_use]
    pub const fn dealer(&self) -> &Hand {
        &self.dealer
    }

    /// The shoe.
    #[must_use]
    pub const fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Time of the last transition.
    #[must_use]
    pub const fn last_activity(&self) -> Instant {
        self.last_activity
    }

    /// Snapshot for display.
    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView {
            owner: self.owner,
            handle: self.handle,
            bet: self.bet.clone(),
            player: self.player.render(),
            dealer: self.dealer.render(),
        }
    }
}
