//! Table engine and session management.

use core::sync::atomic::{AtomicU64, Ordering};

use num_bigint::BigInt;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::warn;

use crate::deck::Deck;
use crate::error::LedgerError;
use crate::id::{MessageHandle, PlayerId};
use crate::ledger::Ledger;
use crate::options::TableOptions;
use crate::render::{RenderRequest, RenderStatus, Renderer, SessionView, build};
use crate::sync::Mutex;

pub mod account;
mod actions;
mod bet;
mod dealer;
pub mod reaper;
pub mod registry;
pub mod session;
pub mod state;

pub use account::{DailyClaim, LEADERBOARD_PAGE_SIZE, LeaderboardEntry, LeaderboardPage};
pub use actions::ActionEvent;
pub use reaper::Reaper;
pub use registry::{SessionCell, SessionRegistry};
pub use session::{GameSession, Step};
pub use state::{ActionKind, SessionState};

/// A blackjack table running one round per player against the house.
///
/// The table owns the session registry and talks to the outside world
/// through a [`Ledger`] and a [`Renderer`]. Share it behind an `Arc` between
/// the transport's handlers and the [`Reaper`].
pub struct Table<L, R> {
    /// Table options.
    options: TableOptions,
    /// Balance store.
    ledger: L,
    /// Chat transport.
    renderer: R,
    /// Live sessions.
    registry: SessionRegistry,
    /// Next message handle to issue.
    next_handle: AtomicU64,
    /// Seeds each new shoe.
    rng: Mutex<ChaCha8Rng>,
}

impl<L: Ledger, R: Renderer> Table<L, R> {
    /// Creates a table with the given seed.
    ///
    /// # Example
    ///
    /// ```
    /// use bjtable::{MemoryLedger, RenderRequest, Renderer, Table, TableOptions, TransportError};
    ///
    /// struct Discard;
    ///
    /// impl Renderer for Discard {
    ///     async fn render(&self, _request: RenderRequest) -> Result<(), TransportError> {
    ///         Ok(())
    ///     }
    /// }
    ///
    /// let options = TableOptions::default();
    /// let ledger = MemoryLedger::new(options.starting_balance.clone());
    /// let table = Table::new(options, ledger, Discard, 42);
    /// assert_eq!(table.live_sessions(), 0);
    /// ```
    #[must_use]
    pub fn new(options: TableOptions, ledger: L, renderer: R, seed: u64) -> Self {
        Self {
            options,
            ledger,
            renderer,
            registry: SessionRegistry::new(),
            next_handle: AtomicU64::new(1),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Table options.
    pub const fn options(&self) -> &TableOptions {
        &self.options
    }

    /// The ledger backing this table.
    pub const fn ledger(&self) -> &L {
        &self.ledger
    }

    /// The transport this table renders to.
    pub const fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Live sessions.
    pub const fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Number of live sessions.
    pub fn live_sessions(&self) -> usize {
        self.registry.len()
    }

    /// Current balance of `player`.
    ///
    /// # Errors
    ///
    /// Returns the ledger's error.
    pub async fn balance(&self, player: PlayerId) -> Result<BigInt, LedgerError> {
        self.ledger.balance(player).await
    }

    /// Snapshot of the live session of `player`, if any.
    pub async fn session_view(&self, player: PlayerId) -> Option<SessionView> {
        let (_, cell) = self.registry.get(player)?;
        let session = cell.lock().await;
        if session.is_terminal() {
            return None;
        }
        Some(session.view())
    }

    /// A fresh shoe with its own seed.
    pub fn fresh_deck(&self) -> Deck {
        let seed = self.rng.lock().random();
        Deck::new(self.options.copies_per_rank, seed)
    }

    fn issue_handle(&self) -> MessageHandle {
        MessageHandle(self.next_handle.fetch_add(1, Ordering::SeqCst))
    }

    /// Renders `session` in `status`. Failures are logged and swallowed.
    async fn show(&self, session: &GameSession, status: &RenderStatus) -> RenderRequest {
        let request = build(&session.view(), status);
        if let Err(err) = self.renderer.render(request.clone()).await {
            warn!(
                owner = %session.owner(),
                handle = %session.handle(),
                %err,
                "render failed"
            );
        }
        request
    }
}
