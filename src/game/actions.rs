use tokio::time::Instant;
use tracing::debug;

use crate::error::ActionError;
use crate::id::{MessageHandle, PlayerId};
use crate::ledger::Ledger;
use crate::render::{RenderRequest, RenderStatus, Renderer};

use super::Table;
use super::session::Step;
use super::state::ActionKind;

/// A button press delivered by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionEvent {
    /// Who pressed the button.
    pub player: PlayerId,
    /// The message the button belongs to.
    pub message: MessageHandle,
    /// Which button.
    pub kind: ActionKind,
}

impl<L: Ledger, R: Renderer> Table<L, R> {
    /// Applies a player action to the round shown by `event.message`.
    ///
    /// The press is checked against the registry before anything changes:
    /// it must come from the round's owner and name the round's current
    /// message. A finished round is settled and removed before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::NotOwner`] or [`ActionError::Stale`] without
    /// side effects. Ledger and invariant failures close the round.
    pub async fn act(&self, event: ActionEvent) -> Result<RenderRequest, ActionError> {
        let owner = self.registry.owner_of(event.message).ok_or_else(|| {
            debug!(player = %event.player, message = %event.message, "press on a finished round");
            ActionError::Stale
        })?;
        if owner != event.player {
            return Err(ActionError::NotOwner);
        }
        let (handle, cell) = self.registry.get(owner).ok_or(ActionError::Stale)?;
        if handle != event.message {
            return Err(ActionError::Stale);
        }

        let mut session = cell.lock().await;
        if session.is_terminal() {
            // Settled by the reaper or a concurrent press while we waited.
            debug!(%owner, %handle, kind = event.kind.as_str(), "press lost the race");
            return Err(ActionError::Stale);
        }

        let now = Instant::now();
        let step = match event.kind {
            ActionKind::Hit => session.hit(now),
            ActionKind::Stand => session.stand(now),
            ActionKind::Forfeit => Ok(session.forfeit(now)),
        };
        let step = match step {
            Ok(step) => step,
            Err(violation) => {
                self.abort(&mut session, violation).await;
                return Err(violation.into());
            }
        };

        let status = match step {
            Step::Continue => RenderStatus::InProgress,
            Step::Finished { kind, outcome } => {
                match self.settle::<ActionError>(&mut session, kind, outcome).await {
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
