//! A concurrent blackjack session engine for chat bots.
//!
//! The crate provides a [`Table`] that runs one round per player against the
//! house. Player presses arrive through [`Table::act`], finished rounds are
//! settled against a [`Ledger`], every change is pushed to a [`Renderer`],
//! and a [`Reaper`] forfeits rounds left idle past the table's timeout. The
//! table also hands out a daily supply and pages through a balance
//! leaderboard.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bjtable::{MemoryLedger, PlayerId, Reaper, RenderRequest, Renderer, Table, TableOptions, TransportError};
//!
//! struct Print;
//!
//! impl Renderer for Print {
//!     async fn render(&self, request: RenderRequest) -> Result<(), TransportError> {
//!         println!("{request:?}");
//!         Ok(())
//!     }
//! }
//!
//! # async fn run() {
//! let options = TableOptions::default();
//! let ledger = MemoryLedger::new(options.starting_balance.clone());
//! let table = Arc::new(Table::new(options, ledger, Print, 42));
//! let reaper = Reaper::start(Arc::clone(&table));
//!
//! let _ = table.start(PlayerId(1), "half").await;
//! reaper.stop().await;
//! # }
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

pub mod bet;
pub mod card;
pub mod deck;
pub mod error;
pub mod game;
pub mod hand;
pub mod id;
pub mod ledger;
pub mod options;
pub mod render;
pub mod result;
mod sync;

// Re-export main types
pub use bet::{BetExpr, parse_bet};
pub use card::{RANK_COUNT, Rank};
pub use deck::{DEFAULT_COPIES_PER_RANK, Deck};
pub use error::{
    ActionError, BetError, DailyError, ErrorClass, InvariantViolation, LeaderboardError,
    LedgerError, RegistryError, StartError, TransportError, UnknownAction,
};
pub use game::{
    ActionEvent, ActionKind, DailyClaim, GameSession, LEADERBOARD_PAGE_SIZE, LeaderboardEntry,
    LeaderboardPage, Reaper, SessionRegistry, SessionState, Step, Table,
};
pub use hand::{BLACKJACK, Hand, RenderedHand};
pub use id::{MessageHandle, PlayerId};
pub use ledger::{Ledger, MemoryLedger, TransferReceipt, transfer};
pub use options::{MIN_REAP_INTERVAL, TableOptions};
pub use render::{
    ColorState, Control, Field, FinishKind, RenderRequest, RenderStatus, Renderer, SessionView,
};
pub use result::{CHARLIE_CARDS, Multiplier, Outcome, Verdict, resolve};
