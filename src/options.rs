//! Table configuration options.

use core::time::Duration;

use num_bigint::BigInt;

use crate::deck::DEFAULT_COPIES_PER_RANK;

/// Shortest reaper scan interval. Shorter intervals are raised to this.
pub const MIN_REAP_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for a [`Table`](crate::Table).
///
/// Use the builder pattern to customize options:
///
/// ```
/// use std::time::Duration;
/// use bjtable::TableOptions;
///
/// let options = TableOptions::default()
///     .with_idle_timeout(Duration::from_secs(30))
///     .with_copies_per_rank(24);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOptions {
    /// Copies of each rank in a fresh shoe (32 for eight decks).
    pub copies_per_rank: u16,
    /// A game with no action for longer than this is forfeited.
    pub idle_timeout: Duration,
    /// How often the reaper scans for idle games. Never below
    /// [`MIN_REAP_INTERVAL`] once the reaper runs.
    pub reap_interval: Duration,
    /// The dealer draws while their total is at or below this.
    pub dealer_hits_through: u8,
    /// Balance credited to an account the first time it is seen.
    pub starting_balance: BigInt,
    /// Credited by each daily claim.
    pub daily_amount: BigInt,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            copies_per_rank: DEFAULT_COPIES_PER_RANK,
            idle_timeout: Duration::from_secs(10),
            reap_interval: Duration::from_secs(1),
            dealer_hits_through: 16,
            starting_balance: BigInt::from(1000),
            daily_amount: BigInt::from(100),
        }
    }
}

fn read_env<T: core::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|raw| raw.trim().parse().ok())
}

impl TableOptions {
    /// Defaults overlaid with `BJ_*` environment variables.
    ///
    /// Reads `BJ_IDLE_TIMEOUT_MS`, `BJ_REAP_INTERVAL_MS`,
    /// `BJ_STARTING_BALANCE`, `BJ_DAILY_AMOUNT` and `BJ_COPIES_PER_RANK`.
    /// Unset or unparsable values keep their default.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            copies_per_rank: read_env("BJ_COPIES_PER_RANK")
                .filter(|&copies: &u16| copies > 0)
                .unwrap_or(defaults.copies_per_rank),
            idle_timeout: read_env("BJ_IDLE_TIMEOUT_MS")
                .map_or(defaults.idle_timeout, Duration::from_millis),
            reap_interval: read_env("BJ_REAP_INTERVAL_MS")
                .filter(|&ms: &u64| ms > 0)
                .map_or(defaults.reap_interval, Duration::from_millis),
            dealer_hits_through: defaults.dealer_hits_through,
            starting_balance: read_env("BJ_STARTING_BALANCE")
                .unwrap_or(defaults.starting_balance),
            daily_amount: read_env("BJ_DAILY_AMOUNT").unwrap_or(defaults.daily_amount),
        }
    }

    /// Sets the copies of each rank in a fresh shoe.
    ///
    /// # Example
    ///
    /// ```
    /// use bjtable::TableOptions;
    ///
    /// let options = TableOptions::default().with_copies_per_rank(4);
    /// assert_eq!(options.copies_per_rank, 4);
    /// ```
    #[must_use]
    pub fn with_copies_per_rank(mut self, copies: u16) -> Self {
        self.copies_per_rank = copies;
        self
    }

    /// Sets the idle timeout.
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Sets the reaper scan interval, raised to at least [`MIN_REAP_INTERVAL`].
    #[must_use]
    pub fn with_reap_interval(mut self, interval: Duration) -> Self {
        self.reap_interval = interval.max(MIN_REAP_INTERVAL);
        self
    }

    /// Sets the total the dealer keeps drawing through.
    ///
    /// # Example
    ///
    /// ```
    /// use bjtable::TableOptions;
    ///
    /// let options = TableOptions::default().with_dealer_hits_through(17);
    /// assert_eq!(options.dealer_hits_through, 17);
    /// ```
    #[must_use]
    pub fn with_dealer_hits_through(mut self, total: u8) -> Self {
        self.dealer_hits_through = total;
        self
    }

    /// Sets the balance new accounts start with.
    #[must_use]
    pub fn with_starting_balance(mut self, balance: BigInt) -> Self {
        self.starting_balance = balance;
        self
    }

    /// Sets the amount credited by each daily claim.
    #[must_use]
    pub fn with_daily_amount(mut self, amount: BigInt) -> Self {
        self.daily_amount = amount;
        self
    }
}
