//! Session state and player actions.

use core::str::FromStr;

use crate::error::UnknownAction;

/// Where a session is in its round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Opening cards are being dealt.
    Dealing,
    /// Waiting for the player to hit, stand or forfeit.
    AwaitingAction,
    /// Round resolved and settled, or aborted. No further transitions.
    Terminal,
}

/// A button the player can press on a running game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Draw a card.
    Hit,
    /// Let the dealer play out and compare hands.
    Stand,
    /// Give up the bet.
    Forfeit,
}

impl ActionKind {
    /// Identifier used on buttons.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Stand => "stand",
            Self::Forfeit => "forfeit",
        }
    }
}

impl FromStr for ActionKind {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h" | "hit" => Ok(Self::Hit),
            "s" | "stand" => Ok(Self::Stand),
            "f" | "forfeit" => Ok(Self::Forfeit),
            _ => Err(UnknownAction),
        }
    }
}
