//! Render requests sent to the chat transport.
//!
//! Every message the table produces goes through [`build`], which turns a
//! [`SessionView`] and a [`RenderStatus`] into one [`RenderRequest`].

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::future::Future;

use num_bigint::BigInt;
use num_traits::Signed;

use crate::error::TransportError;
use crate::hand::RenderedHand;
use crate::id::{MessageHandle, PlayerId};
use crate::result::{Multiplier, Verdict};

/// Title shown on every game message.
pub const TITLE: &str = "Blackjack";

/// Embed color, by round state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorState {
    /// Round still running, or a push.
    Neutral,
    /// Player came out ahead.
    Won,
    /// Player lost the bet.
    Lost,
}

impl ColorState {
    /// RGB value used by chat embeds.
    #[must_use]
    pub const fn rgb(self) -> u32 {
        match self {
            Self::Neutral => 0x00ff_ff00,
            Self::Won => 0x0000_ff00,
            Self::Lost => 0x00ff_0000,
        }
    }
}

/// Buttons attached to a running game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// Draw a card.
    Hit,
    /// Let the dealer play out.
    Stand,
    /// Give up the bet.
    Forfeit,
}

/// One named field of the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field heading.
    pub name: String,
    /// Field body.
    pub value: String,
}

impl Field {
    fn new(name: &str, value: String) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }
}

/// A message to post or edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Message to post or replace.
    pub handle: MessageHandle,
    /// Player the game belongs to.
    pub owner: PlayerId,
    /// Message title.
    pub title: String,
    /// Player, Dealer, and Result once the round is over.
    pub fields: Vec<Field>,
    /// Embed color.
    pub color: ColorState,
    /// Buttons; empty once the round is over.
    pub controls: Vec<Control>,
}

/// How a finished round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FinishKind {
    /// Resolved by comparing hands.
    Resolved(Verdict),
    /// Two-card 21 on the opening deal.
    Natural,
    /// Player gave up.
    Forfeit,
    /// Player went idle and the game was reaped.
    Timeout,
}

/// What to show in the Result field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderStatus {
    /// Waiting for the player.
    InProgress,
    /// Round over and settled.
    Finished {
        /// How it ended.
        kind: FinishKind,
        /// Payout ratio applied.
        multiplier: Multiplier,
        /// Balance change.
        delta: BigInt,
        /// Balance after settlement.
        balance: BigInt,
    },
    /// Round cut short by an engine fault; nothing was settled.
    Aborted,
}

/// Snapshot of a game for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    /// Owner of the game.
    pub owner: PlayerId,
    /// Message showing the game.
    pub handle: MessageHandle,
    /// Amount at stake.
    pub bet: BigInt,
    /// Player's cards.
    pub player: RenderedHand,
    /// Dealer's cards.
    pub dealer: RenderedHand,
}

/// Chat transport that shows render requests.
pub trait Renderer: Send + Sync {
    /// Posts or edits the message named by `request.handle`.
    fn render(
        &self,
        request: RenderRequest,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

fn result_line(kind: FinishKind, delta: &BigInt, balance: &BigInt) -> (String, ColorState) {
    let amount = delta.abs();
    let (headline, color) = match kind {
        FinishKind::Natural => (alloc::format!("Blackjack! You won {amount}."), ColorState::Won),
        FinishKind::Forfeit => (alloc::format!("You forfeited {amount}."), ColorState::Lost),
        FinishKind::Timeout => (
            alloc::format!("Timed out. You lost {amount}."),
            ColorState::Lost,
        ),
        FinishKind::Resolved(Verdict::Push) => ("Push.".to_string(), ColorState::Neutral),
        FinishKind::Resolved(Verdict::Win) => {
            (alloc::format!("You won {amount}!"), ColorState::Won)
        }
        FinishKind::Resolved(Verdict::Lose) => {
            (alloc::format!("You lost {amount}."), ColorState::Lost)
        }
    };
    (alloc::format!("{headline}\nBalance: {balance}"), color)
}

/// Builds the message for `view` in `status`.
#[must_use]
pub fn build(view: &SessionView, status: &RenderStatus) -> RenderRequest {
    let mut fields = alloc::vec![
        Field::new("Player", view.player.line()),
        Field::new("Dealer", view.dealer.line()),
    ];

    let (color, controls) = match status {
        RenderStatus::InProgress => (
            ColorState::Neutral,
            alloc::vec![Control::Hit, Control::Stand, Control::Forfeit],
        ),
        RenderStatus::Finished {
            kind,
            multiplier,
            delta,
            balance,
        } => {
            let (mut value, color) = result_line(*kind, delta, balance);
            if multiplier.numer() != 0 && delta.is_positive() {
                value.push_str(&alloc::format!("\nPayout: {multiplier}"));
            }
            fields.push(Field::new("Result", value));
            (color, Vec::new())
        }
        RenderStatus::Aborted => {
            fields.push(Field::new(
                "Result",
                "This game was cancelled. No money changed hands.".to_string(),
            ));
            (ColorState::Neutral, Vec::new())
        }
    };

    RenderRequest {
        handle: view.handle,
        owner: view.owner,
        title: alloc::format!("{TITLE} ({})", view.bet),
        fields,
        color,
        controls,
    }
}
