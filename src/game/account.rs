//! Daily supply and the balance leaderboard.

use alloc::vec::Vec;

use chrono::{DateTime, Local, TimeZone};
use num_bigint::BigInt;
use tracing::{debug, info};

use crate::error::{DailyError, LeaderboardError};
use crate::id::PlayerId;
use crate::ledger::Ledger;
use crate::render::Renderer;

use super::Table;

/// Players listed per leaderboard page.
pub const LEADERBOARD_PAGE_SIZE: usize = 10;

const SECONDS_PER_DAY: i64 = 86_400;

/// A successful daily claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyClaim {
    /// Balance after the credit.
    pub balance: BigInt,
    /// When the next claim opens, in Unix seconds.
    pub next_claim: i64,
}

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// Position on the board, counted from 1.
    pub rank: usize,
    /// The player.
    pub player: PlayerId,
    /// Their balance.
    pub balance: BigInt,
}

/// One page of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardPage {
    /// This page, counted from 1.
    pub page: usize,
    /// Pages available.
    pub pages: usize,
    /// Rows on this page, richest first.
    pub entries: Vec<LeaderboardEntry>,
}

/// Start of the day after `now`, in `now`'s time zone, as Unix seconds.
fn next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> i64 {
    now.date_naive()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .and_then(|midnight| now.timezone().from_local_datetime(&midnight).earliest())
        .map_or_else(|| now.timestamp() + SECONDS_PER_DAY, |at| at.timestamp())
}

impl<L: Ledger, R: Renderer> Table<L, R> {
    /// Credits the daily supply, claimable once per local calendar day.
    ///
    /// # Errors
    ///
    /// Returns [`DailyError::AlreadyClaimed`] until the next local midnight,
    /// or the ledger's error.
    pub async fn claim_daily(&self, player: PlayerId) -> Result<DailyClaim, DailyError> {
        self.claim_daily_at(player, &Local::now()).await
    }

    /// Credits the daily supply as of `now`. The claim locks until the
    /// midnight that follows `now` in `now`'s time zone.
    ///
    /// # Errors
    ///
    /// Same as [`Table::claim_daily`].
    pub async fn claim_daily_at<Tz: TimeZone>(
        &self,
        player: PlayerId,
        now: &DateTime<Tz>,
    ) -> Result<DailyClaim, DailyError> {
        let at = now.timestamp();
        let next_claim = next_midnight(now);
        let amount = self.options.daily_amount.clone();

        match self
            .ledger
            .claim_daily(player, amount.clone(), at, next_claim)
            .await
        {
            Ok(balance) => {
                info!(%player, %amount, %balance, next_claim, "daily supply claimed");
                Ok(DailyClaim {
                    balance,
                    next_claim,
                })
            }
            Err(err) => {
                debug!(%player, %err, "daily claim refused");
                Err(err)
            }
        }
    }

    /// Page `page` of the balance leaderboard, counted from 1.
    ///
    /// An empty ledger still has one (empty) page.
    ///
    /// # Errors
    ///
    /// Returns [`LeaderboardError::PageOutOfRange`] for page 0 or a page past
    /// the last, or the ledger's error.
    pub async fn leaderboard(&self, page: usize) -> Result<LeaderboardPage, LeaderboardError> {
        let accounts = self.ledger.account_count().await?;
        let pages = accounts.div_ceil(LEADERBOARD_PAGE_SIZE).max(1);
        if page == 0 || page > pages {
            return Err(LeaderboardError::PageOutOfRange { page, pages });
        }

        let offset = (page - 1) * LEADERBOARD_PAGE_SIZE;
        let entries = self
            .ledger
            .richest(offset, LEADERBOARD_PAGE_SIZE)
            .await?
            .into_iter()
            .enumerate()
            .map(|(index, (player, balance))| LeaderboardEntry {
                rank: offset + index + 1,
                player,
                balance,
            })
            .collect();

        Ok(LeaderboardPage {
            page,
            pages,
            entries,
        })
    }
}
