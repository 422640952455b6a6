use num_bigint::BigInt;
use num_traits::Zero;
use tracing::{error, info};

use crate::error::{InvariantViolation, LedgerError};
use crate::hand::BLACKJACK;
use crate::ledger::Ledger;
use crate::render::{FinishKind, RenderStatus, Renderer};
use crate::result::Outcome;

use super::Table;
use super::session::GameSession;

/// Redraws allowed when correcting a dealer opening 21. A shoe that keeps
/// producing 21s after this many tries is left as dealt.
const MAX_OPENING_REDRAWS: usize = 64;

impl GameSession {
    pub(super) fn dealer_must_draw(&self) -> bool {
        self.dealer.total() <= self.dealer_hits_through
    }

    /// Deals the dealer's two cards, undoes a dealer 21, then deals the
    /// player's two cards.
    pub(super) fn deal_opening(&mut self) -> Result<(), InvariantViolation> {
        for _ in 0..2 {
            let card = self.deck.draw()?;
            self.dealer.add_card(card);
        }

        for _ in 0..MAX_OPENING_REDRAWS {
            if self.dealer.total() < BLACKJACK {
                break;
            }
            if let Some(card) = self.dealer.pop_card() {
                self.deck.put_back(card)?;
            }
            let card = self.deck.draw()?;
            self.dealer.add_card(card);
        }

        for _ in 0..2 {
            let card = self.deck.draw()?;
            self.player.add_card(card);
        }
        Ok(())
    }

    /// Dealer draws until over the house limit.
    ///
    /// Returns the number of cards drawn.
    pub(super) fn dealer_play(&mut self) -> Result<usize, InvariantViolation> {
        let mut drawn = 0;
        while self.dealer_must_draw() {
            let card = self.deck.draw()?;
            self.dealer.add_card(card);
            drawn += 1;
        }
        Ok(drawn)
    }
}

impl<L: Ledger, R: Renderer> Table<L, R> {
    /// Settles a finished round: ledger first, then registry removal.
    ///
    /// The caller must hold the session's lock. The session is terminal when
    /// this returns, whether or not the ledger accepted the write.
    pub(super) async fn settle<E>(
        &self,
        session: &mut GameSession,
        kind: FinishKind,
        outcome: Outcome,
    ) -> Result<RenderStatus, E>
    where
        E: From<LedgerError> + From<InvariantViolation>,
    {
        session.mark_settled()?;
        let owner = session.owner();
        let delta = outcome.delta(session.bet());

        let result = if delta.is_zero() {
            self.ledger.balance(owner).await
        } else {
            self.ledger.add(owner, delta.clone()).await
        };
        self.registry.remove_if_matches(owner, session.handle());

        let balance: BigInt = result.map_err(|err| {
            error!(%owner, handle = %session.handle(), %err, "settlement failed, session closed");
            err
        })?;

        info!(
            %owner,
            handle = %session.handle(),
            ?kind,
            bet = %session.bet(),
            %delta,
            %balance,
            "round settled"
        );
        Ok(RenderStatus::Finished {
            kind,
            multiplier: outcome.multiplier,
            delta,
            balance,
        })
    }

    /// Closes a session whose invariants broke. No money moves.
    pub(super) async fn abort(&self, session: &mut GameSession, violation: InvariantViolation) {
        error!(
            owner = %session.owner(),
            handle = %session.handle(),
            %violation,
            "session aborted"
        );
        session.terminate();
        self.registry
            .remove_if_matches(session.owner(), session.handle());
        self.show(session, &RenderStatus::Aborted).await;
    }
}
