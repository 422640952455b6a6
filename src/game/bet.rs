use tokio::time::Instant;
use tracing::{debug, info};

use crate::bet::parse_bet;
use crate::deck::Deck;
use crate::error::StartError;
use crate::id::PlayerId;
use crate::ledger::Ledger;
use crate::render::{RenderRequest, RenderStatus, Renderer};

use super::Table;
use super::session::{GameSession, Step};

impl<L: Ledger, R: Renderer> Table<L, R> {
    /// Starts a round for `player` with a fresh shoe.
    ///
    /// The bet expression is resolved against the player's balance right now.
    /// A natural on the opening deal is settled before this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the player already has a live round, the bet is
    /// malformed or zero, the ledger fails, or the shoe runs out.
    pub async fn start(
        &self,
        player: PlayerId,
        bet_expr: &str,
    ) -> Result<RenderRequest, StartError> {
        let deck = self.fresh_deck();
        self.start_with_deck(player, bet_expr, deck).await
    }

    /// Starts a round dealt from `deck`.
    ///
    /// # Errors
    ///
    /// Same as [`Table::start`].
    pub async fn start_with_deck(
        &self,
        player: PlayerId,
        bet_expr: &str,
        deck: Deck,
    ) -> Result<RenderRequest, StartError> {
        if self.registry.contains(player) {
            debug!(%player, "start rejected, round already live");
            return Err(StartError::AlreadyPlaying);
        }

        let balance = self.ledger.balance(player).await?;
        let bet = parse_bet(bet_expr, &balance)?;

        let handle = self.issue_handle();
        let session = GameSession::deal(
            player,
            handle,
            bet,
            deck,
            self.options.dealer_hits_through,
            Instant::now(),
        )?;
        let cell = self.registry.create(player, handle, session)?;
        let mut session = cell.lock().await;
        info!(%player, %handle, bet = %session.bet(), "round started");

        let status = match session.open() {
            Step::Continue => RenderStatus::InProgress,
            Step::Finished { kind, outcome } => {
                let status = self
                    .settle::<StartError>(&mut session, kind, outcome)
                    .await;
                match status {
                    Ok(status) => status,
                    Err(err) => {
                        self.show(&session, &RenderStatus::Aborted).await;
                        return Err(err);
                    }
                }
            }
        };
        Ok(self.show(&session, &status).await)
    }
}
