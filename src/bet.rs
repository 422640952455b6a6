//! Bet expressions.
//!
//! A bet is written as a plain amount (`250`), a share of the balance
//! (`25%`), or one of the words `half` and `all`. The amount is fixed against
//! the balance at the moment the game starts.

use core::str::FromStr;

use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::error::BetError;

/// A parsed bet expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BetExpr {
    /// A literal whole amount.
    Amount(BigInt),
    /// A percentage of the balance, 0 to 100.
    Percent(u8),
    /// Half the balance, rounded down.
    Half,
    /// The whole balance.
    All,
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl FromStr for BetExpr {
    type Err = BetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        if s.eq_ignore_ascii_case("half") {
            return Ok(Self::Half);
        }
        if let Some(number) = s.strip_suffix('%') {
            if !is_digits(number) {
                return Err(BetError::Malformed);
            }
            let percent: u8 = number.parse().map_err(|_| BetError::Malformed)?;
            if percent > 100 {
                return Err(BetError::Malformed);
            }
            return Ok(Self::Percent(percent));
        }

        if !is_digits(s) {
            return Err(BetError::Malformed);
        }
        let amount = s.parse::<BigInt>().map_err(|_| BetError::Malformed)?;
        Ok(Self::Amount(amount))
    }
}

impl BetExpr {
    /// Works out the bet against `balance`.
    ///
    /// Literal amounts above the balance are capped at the balance.
    #[must_use]
    pub fn amount(&self, balance: &BigInt) -> BigInt {
        let balance = if balance.is_negative() {
            BigInt::zero()
        } else {
            balance.clone()
        };
        match self {
            Self::Amount(amount) => amount.min(&balance).clone(),
            Self::Percent(percent) => balance * BigInt::from(*percent) / BigInt::from(100),
            Self::Half => balance / BigInt::from(2),
            Self::All => balance,
        }
    }
}

/// Parses `expr` and resolves it against `balance`.
///
/// # Errors
///
/// Returns [`BetError::Malformed`] for text outside the grammar and
/// [`BetError::ZeroBet`] when the bet works out to nothing.
pub fn parse_bet(expr: &str, balance: &BigInt) -> Result<BigInt, BetError> {
    let amount = expr.parse::<BetExpr>()?.amount(balance);
    if amount.is_positive() {
        Ok(amount)
    } else {
        Err(BetError::ZeroBet)
    }
}
