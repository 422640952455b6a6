//! Error types for table operations.

use alloc::string::String;

use thiserror::Error;

/// How the transport layer should treat an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Bad input from the player. Nothing was mutated.
    UserInput,
    /// The request collides with live or already-resolved state. Nothing was mutated.
    Conflict,
    /// An engine invariant broke. The affected session was terminated.
    Invariant,
    /// The ledger store failed.
    Ledger,
    /// Rendering failed. Settlement, if any, already committed.
    Transport,
}

/// Errors that can occur while parsing a bet expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BetError {
    /// The expression is not an amount, a percentage, `half` or `all`.
    #[error("bet must be an amount, a percentage, `half` or `all`")]
    Malformed,
    /// The bet works out to zero.
    #[error("bet amount is zero")]
    ZeroBet,
}

/// Broken engine invariants. Fatal to the affected session only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// Every card in the shoe has been drawn.
    #[error("the shoe is exhausted")]
    DeckExhausted,
    /// A card was returned to a shoe that never dealt it.
    #[error("card returned to a full shoe")]
    DeckOverfilled,
    /// A session was settled twice.
    #[error("session already settled")]
    DoubleSettlement,
}

/// Errors raised by a ledger store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The backing store could not be reached or refused the write.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
    /// A transfer asked for more than the sender holds.
    #[error("insufficient funds")]
    InsufficientFunds,
    /// A transfer amount was zero or negative.
    #[error("transfer amount must be positive")]
    NonPositiveAmount,
}

/// Errors raised by the render transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The message could not be posted or edited.
    #[error("render failed: {0}")]
    Failed(String),
}

/// Errors that can occur when starting a game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    /// The bet expression was rejected.
    #[error(transparent)]
    Bet(#[from] BetError),
    /// The player already has a live game.
    #[error("player already has a game in progress")]
    AlreadyPlaying,
    /// The ledger failed while reading the balance or settling a natural.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// The deal hit a broken invariant.
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

impl StartError {
    /// Classifies the error for the transport layer.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Bet(_) => ErrorClass::UserInput,
            Self::AlreadyPlaying => ErrorClass::Conflict,
            Self::Ledger(_) => ErrorClass::Ledger,
            Self::Invariant(_) => ErrorClass::Invariant,
        }
    }
}

/// Errors that can occur while handling a player action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The referenced game belongs to someone else.
    #[error("this game belongs to another player")]
    NotOwner,
    /// The referenced message no longer has a live game behind it.
    #[error("this game has already ended")]
    Stale,
    /// Settlement failed; the session was closed without payout.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// The session hit a broken invariant and was closed.
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

impl ActionError {
    /// Classifies the error for the transport layer.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::NotOwner => ErrorClass::UserInput,
            Self::Stale => ErrorClass::Conflict,
            Self::Ledger(_) => ErrorClass::Ledger,
            Self::Invariant(_) => ErrorClass::Invariant,
        }
    }
}

/// Errors raised by the session registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The player already has a live session.
    #[error("player already has a live session")]
    Occupied,
}

impl From<RegistryError> for StartError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Occupied => Self::AlreadyPlaying,
        }
    }
}

impl TransportError {
    /// Classifies the error for the transport layer.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        ErrorClass::Transport
    }
}

/// Errors that can occur when claiming the daily supply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DailyError {
    /// Already claimed; the next claim opens at `next_claim` (Unix seconds).
    #[error("daily supply already claimed, come back at {next_claim}")]
    AlreadyClaimed {
        /// When the next claim opens, in Unix seconds.
        next_claim: i64,
    },
    /// The ledger failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl DailyError {
    /// Classifies the error for the transport layer.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::AlreadyClaimed { .. } => ErrorClass::Conflict,
            Self::Ledger(_) => ErrorClass::Ledger,
        }
    }
}

/// Errors that can occur when reading the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaderboardError {
    /// The requested page does not exist.
    #[error("exceeded number of pages: {page}/{pages}")]
    PageOutOfRange {
        /// Requested page, counted from 1.
        page: usize,
        /// Pages available.
        pages: usize,
    },
    /// The ledger failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl LeaderboardError {
    /// Classifies the error for the transport layer.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::PageOutOfRange { .. } => ErrorClass::UserInput,
            Self::Ledger(_) => ErrorClass::Ledger,
        }
    }
}

/// A button identifier that names no action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown action")]
pub struct UnknownAction;
