//! Player balances.
//!
//! Settlement moves money through [`Ledger::add`] and transfers debit through
//! [`Ledger::try_debit`]. A store only needs to make each call atomic for one
//! player. Calls for different players may run in parallel.

use alloc::vec::Vec;
use core::future::Future;
use std::collections::HashMap;

use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use tracing::{debug, error, warn};

use crate::error::{DailyError, LedgerError};
use crate::id::PlayerId;
use crate::sync::Mutex;

/// Balance store consumed by the table.
pub trait Ledger: Send + Sync {
    /// Current balance of `player`.
    fn balance(
        &self,
        player: PlayerId,
    ) -> impl Future<Output = Result<BigInt, LedgerError>> + Send;

    /// Adds `delta` (which may be negative) and returns the new balance.
    fn add(
        &self,
        player: PlayerId,
        delta: BigInt,
    ) -> impl Future<Output = Result<BigInt, LedgerError>> + Send;

    /// Subtracts `amount` only if `player` holds at least that much, and
    /// returns the new balance. The check and the write are one step.
    fn try_debit(
        &self,
        player: PlayerId,
        amount: BigInt,
    ) -> impl Future<Output = Result<BigInt, LedgerError>> + Send;

    /// Overwrites the balance of `player`.
    fn set(
        &self,
        player: PlayerId,
        balance: BigInt,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Credits the daily supply unless it was already claimed before
    /// `next_claim` came due. `now` and `next_claim` are Unix seconds.
    fn claim_daily(
        &self,
        player: PlayerId,
        amount: BigInt,
        now: i64,
        next_claim: i64,
    ) -> impl Future<Output = Result<BigInt, DailyError>> + Send;

    /// Number of opened accounts.
    fn account_count(&self) -> impl Future<Output = Result<usize, LedgerError>> + Send;

    /// Accounts by balance, highest first, skipping `offset` and returning at
    /// most `limit`.
    fn richest(
        &self,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<(PlayerId, BigInt)>, LedgerError>> + Send;
}

#[derive(Debug, Clone)]
struct Account {
    balance: BigInt,
    /// Daily supply is locked until this Unix second.
    daily_until: i64,
}

/// In-process ledger. Accounts are opened with a starting balance on first use.
#[derive(Default)]
pub struct MemoryLedger {
    accounts: Mutex<HashMap<PlayerId, Account>>,
    starting_balance: BigInt,
}

impl MemoryLedger {
    /// Creates an empty ledger that opens new accounts at `starting_balance`.
    #[must_use]
    pub fn new(starting_balance: BigInt) -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            starting_balance,
        }
    }

    fn with_account<T>(&self, player: PlayerId, f: impl FnOnce(&mut Account) -> T) -> T {
        let mut accounts = self.accounts.lock();
        let account = accounts.entry(player).or_insert_with(|| Account {
            balance: self.starting_balance.clone(),
            daily_until: i64::MIN,
        });
        f(account)
    }
}

impl Ledger for MemoryLedger {
    async fn balance(&self, player: PlayerId) -> Result<BigInt, LedgerError> {
        Ok(self.with_account(player, |account| account.balance.clone()))
    }

    async fn add(&self, player: PlayerId, delta: BigInt) -> Result<BigInt, LedgerError> {
        Ok(self.with_account(player, |account| {
            account.balance += delta;
            account.balance.clone()
        }))
    }

    async fn try_debit(&self, player: PlayerId, amount: BigInt) -> Result<BigInt, LedgerError> {
        self.with_account(player, |account| {
            if account.balance < amount {
                return Err(LedgerError::InsufficientFunds);
            }
            account.balance -= amount;
            Ok(account.balance.clone())
        })
    }

    async fn set(&self, player: PlayerId, balance: BigInt) -> Result<(), LedgerError> {
        self.with_account(player, |account| account.balance = balance);
        Ok(())
    }

    async fn claim_daily(
        &self,
        player: PlayerId,
        amount: BigInt,
        now: i64,
        next_claim: i64,
    ) -> Result<BigInt, DailyError> {
        self.with_account(player, |account| {
            if now < account.daily_until {
                return Err(DailyError::AlreadyClaimed {
                    next_claim: account.daily_until,
                });
            }
            account.balance += amount;
            account.daily_until = next_claim;
            Ok(account.balance.clone())
        })
    }

    async fn account_count(&self) -> Result<usize, LedgerError> {
        Ok(self.accounts.lock().len())
    }

    async fn richest(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<(PlayerId, BigInt)>, LedgerError> {
        let mut rows: Vec<_> = self
            .accounts
            .lock()
            .iter()
            .map(|(player, account)| (*player, account.balance.clone()))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }
}

/// Amounts moved by [`transfer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Debited from the sender.
    pub sent: BigInt,
    /// Credited to the receiver.
    pub received: BigInt,
    /// Kept by the house.
    pub tax: BigInt,
    /// Sender balance afterwards.
    pub sender_balance: BigInt,
}

/// Moves `amount` from `from` to `to`, keeping `tax_percent` of it.
///
/// The receiver never gets more than the sender paid.
///
/// # Errors
///
/// Returns [`LedgerError::NonPositiveAmount`] or
/// [`LedgerError::InsufficientFunds`] before touching either account, or the
/// store's error if a write fails. A failed credit is refunded to the sender.
pub async fn transfer<L: Ledger>(
    ledger: &L,
    from: PlayerId,
    to: PlayerId,
    amount: BigInt,
    tax_percent: u8,
) -> Result<TransferReceipt, LedgerError> {
    if !amount.is_positive() {
        return Err(LedgerError::NonPositiveAmount);
    }

    let tax = &amount * BigInt::from(tax_percent.min(100)) / BigInt::from(100);
    let received = &amount - &tax;

    let sender_balance = ledger.try_debit(from, amount.clone()).await?;
    if !received.is_zero() {
        if let Err(err) = ledger.add(to, received.clone()).await {
            warn!(%from, %to, %amount, %err, "transfer credit failed, refunding sender");
            if let Err(refund) = ledger.add(from, amount.clone()).await {
                error!(%from, %amount, %refund, "transfer refund failed");
            }
            return Err(err);
        }
    }
    debug!(%from, %to, %amount, %tax, "transfer settled");

    Ok(TransferReceipt {
        sent: amount,
        received,
        tax,
        sender_balance,
    })
}
