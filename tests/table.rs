//! Table integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bjtable::{
    ActionError, ActionEvent, ActionKind, BetError, ColorState, DailyError, Deck, ErrorClass,
    LeaderboardError, Ledger, LedgerError, MemoryLedger, MessageHandle, PlayerId, Rank, Reaper,
    RenderRequest, Renderer, StartError, Table, TableOptions, TransportError,
};
use chrono::{FixedOffset, TimeZone, Utc};
use num_bigint::BigInt;
use Rank::{Ace, Five, Four, King, Nine, Seven, Six, Ten, Three, Two};

#[derive(Default)]
struct Recorder {
    requests: Mutex<Vec<RenderRequest>>,
    fail: bool,
}

impl Recorder {
    fn failing() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last(&self) -> RenderRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

impl Renderer for Recorder {
    async fn render(&self, request: RenderRequest) -> Result<(), TransportError> {
        self.requests.lock().unwrap().push(request);
        if self.fail {
            Err(TransportError::Failed("channel gone".into()))
        } else {
            Ok(())
        }
    }
}

/// Counts writes so tests can prove a round settled exactly once.
struct Counting {
    inner: MemoryLedger,
    adds: AtomicUsize,
    broken: bool,
}

impl Counting {
    fn new() -> Self {
        Self {
            inner: MemoryLedger::new(BigInt::from(1000)),
            adds: AtomicUsize::new(0),
            broken: false,
        }
    }

    fn broken() -> Self {
        Self {
            broken: true,
            ..Self::new()
        }
    }

    fn adds(&self) -> usize {
        self.adds.load(Ordering::SeqCst)
    }
}

impl Ledger for Counting {
    async fn balance(&self, player: PlayerId) -> Result<BigInt, LedgerError> {
        self.inner.balance(player).await
    }

    async fn add(&self, player: PlayerId, delta: BigInt) -> Result<BigInt, LedgerError> {
        if self.broken {
            return Err(LedgerError::Unavailable("disk full".into()));
        }
        self.adds.fetch_add(1, Ordering::SeqCst);
        self.inner.add(player, delta).await
    }

    async fn try_debit(&self, player: PlayerId, amount: BigInt) -> Result<BigInt, LedgerError> {
        if self.broken {
            return Err(LedgerError::Unavailable("disk full".into()));
        }
        self.inner.try_debit(player, amount).await
    }

    async fn set(&self, player: PlayerId, balance: BigInt) -> Result<(), LedgerError> {
        self.inner.set(player, balance).await
    }

    async fn claim_daily(
        &self,
        player: PlayerId,
        amount: BigInt,
        now: i64,
        next_claim: i64,
    ) -> Result<BigInt, DailyError> {
        if self.broken {
            return Err(LedgerError::Unavailable("disk full".into()).into());
        }
        self.inner.claim_daily(player, amount, now, next_claim).await
    }

    async fn account_count(&self) -> Result<usize, LedgerError> {
        self.inner.account_count().await
    }

    async fn richest(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<(PlayerId, BigInt)>, LedgerError> {
        self.inner.richest(offset, limit).await
    }
}

const ALICE: PlayerId = PlayerId(1);
const BOB: PlayerId = PlayerId(2);

fn table_with(ledger: Counting, renderer: Recorder) -> Table<Counting, Recorder> {
    Table::new(TableOptions::default(), ledger, renderer, 7)
}

fn table() -> Table<Counting, Recorder> {
    table_with(Counting::new(), Recorder::default())
}

fn stacked(ranks: &[Rank]) -> Deck {
    Deck::stacked(32, 3, ranks)
}

fn press(player: PlayerId, message: MessageHandle, kind: ActionKind) -> ActionEvent {
    ActionEvent {
        player,
        message,
        kind,
    }
}

async fn balance(table: &Table<Counting, Recorder>, player: PlayerId) -> BigInt {
    table.balance(player).await.unwrap()
}

#[tokio::test]
async fn natural_pays_double_without_waiting_for_action() {
    let table = table();
    let shown = table
        .start_with_deck(ALICE, "100", stacked(&[Ten, Seven, Ace, King]))
        .await
        .unwrap();

    assert!(shown.controls.is_empty());
    assert_eq!(shown.color, ColorState::Won);
    assert_eq!(balance(&table, ALICE).await, BigInt::from(1200));
    assert_eq!(table.live_sessions(), 0);
    assert_eq!(table.ledger().adds(), 1);
}

#[tokio::test]
async fn dealer_opening_twenty_one_is_redrawn_before_player_acts() {
    let table = table();
    let shown = table
        .start_with_deck(ALICE, "100", stacked(&[Ace, King, Six, Ten, Seven]))
        .await
        .unwrap();

    assert_eq!(shown.controls.len(), 3);
    assert_eq!(shown.fields[1].value, "A, 6 (17)");
    assert_eq!(table.live_sessions(), 1);
    assert_eq!(table.registry().owner_of(shown.handle), Some(ALICE));
}

#[tokio::test]
async fn bust_on_hit_debits_full_bet() {
    let table = table();
    let shown = table
        .start_with_deck(ALICE, "100", stacked(&[Ten, Seven, Ten, Nine, Five]))
        .await
        .unwrap();

    let done = table
        .act(press(ALICE, shown.handle, ActionKind::Hit))
        .await
        .unwrap();

    assert_eq!(done.fields[0].value, "10, 9, 5 (24)");
    assert_eq!(done.color, ColorState::Lost);
    assert!(done.controls.is_empty());
    assert_eq!(balance(&table, ALICE).await, BigInt::from(900));
    assert_eq!(table.live_sessions(), 0);
}

#[tokio::test]
async fn dealer_bust_on_hit_pays_even() {
    let table = table();
    let shown = table
        .start_with_deck(ALICE, "100", stacked(&[Ten, Six, Ten, Two, Three, Nine]))
        .await
        .unwrap();

    let done = table
        .act(press(ALICE, shown.handle, ActionKind::Hit))
        .await
        .unwrap();

    assert_eq!(done.fields[1].value, "10, 6, 9 (25)");
    assert_eq!(done.color, ColorState::Won);
    assert_eq!(balance(&table, ALICE).await, BigInt::from(1100));
    assert_eq!(table.live_sessions(), 0);
}

#[tokio::test]
async fn dealer_twenty_one_on_hit_takes_the_bet() {
    let table = table();
    let shown = table
        .start_with_deck(ALICE, "100", stacked(&[Ten, Six, Ten, Two, Three, Five]))
        .await
        .unwrap();

    let done = table
        .act(press(ALICE, shown.handle, ActionKind::Hit))
        .await
        .unwrap();

    assert_eq!(done.fields[1].value, "10, 6, 5 (21)");
    assert_eq!(done.color, ColorState::Lost);
    assert_eq!(balance(&table, ALICE).await, BigInt::from(900));
}

#[tokio::test]
async fn five_card_charlie_pays_three_to_two() {
    let table = table();
    let shown = table
        .start_with_deck(
            ALICE,
            "100",
            stacked(&[Ten, Seven, Two, Three, Two, Four, Five]),
        )
        .await
        .unwrap();

    let hit = press(ALICE, shown.handle, ActionKind::Hit);
    assert_eq!(table.act(hit).await.unwrap().controls.len(), 3);
    assert_eq!(table.act(hit).await.unwrap().controls.len(), 3);
    let done = table.act(hit).await.unwrap();

    assert_eq!(done.fields[0].value, "2, 3, 2, 4, 5 (16)");
    assert_eq!(balance(&table, ALICE).await, BigInt::from(1150));
}

#[tokio::test]
async fn stand_plays_dealer_out_and_pays_even() {
    let table = table();
    let shown = table
        .start_with_deck(ALICE, "all", stacked(&[Ten, Six, Ten, Nine, Two]))
        .await
        .unwrap();

    let done = table
        .act(press(ALICE, shown.handle, ActionKind::Stand))
        .await
        .unwrap();

    assert_eq!(done.fields[1].value, "10, 6, 2 (18)");
    assert_eq!(balance(&table, ALICE).await, BigInt::from(2000));
}

#[tokio::test]
async fn forfeit_debits_full_bet() {
    let table = table();
    let shown = table
        .start_with_deck(ALICE, "25%", stacked(&[Ten, Seven, Ten, Two]))
        .await
        .unwrap();

    table
        .act(press(ALICE, shown.handle, ActionKind::Forfeit))
        .await
        .unwrap();
    assert_eq!(balance(&table, ALICE).await, BigInt::from(750));
}

#[tokio::test]
async fn second_round_while_live_is_a_conflict() {
    let table = table();
    table
        .start_with_deck(ALICE, "10", stacked(&[Ten, Seven, Ten, Two]))
        .await
        .unwrap();

    let err = table.start(ALICE, "10").await.unwrap_err();
    assert_eq!(err, StartError::AlreadyPlaying);
    assert_eq!(err.class(), ErrorClass::Conflict);
    assert_eq!(table.live_sessions(), 1);
    assert_eq!(table.ledger().adds(), 0);
}

#[tokio::test]
async fn bad_bets_are_rejected_before_dealing() {
    let table = table();
    assert_eq!(
        table.start(ALICE, "lots").await.unwrap_err(),
        StartError::Bet(BetError::Malformed)
    );
    assert_eq!(
        table.start(ALICE, "0").await.unwrap_err(),
        StartError::Bet(BetError::ZeroBet)
    );
    assert_eq!(table.live_sessions(), 0);
    assert_eq!(table.renderer().count(), 0);
}

#[tokio::test]
async fn only_the_owner_can_press() {
    let table = table();
    let shown = table
        .start_with_deck(ALICE, "10", stacked(&[Ten, Seven, Ten, Two]))
        .await
        .unwrap();

    let err = table
        .act(press(BOB, shown.handle, ActionKind::Forfeit))
        .await
        .unwrap_err();
    assert_eq!(err, ActionError::NotOwner);
    assert_eq!(err.class(), ErrorClass::UserInput);
    assert_eq!(table.live_sessions(), 1);
    assert_eq!(balance(&table, ALICE).await, BigInt::from(1000));
}

#[tokio::test]
async fn press_on_an_old_message_is_stale() {
    let table = table();
    let first = table
        .start_with_deck(ALICE, "10", stacked(&[Ten, Seven, Ten, Two]))
        .await
        .unwrap();
    table
        .act(press(ALICE, first.handle, ActionKind::Forfeit))
        .await
        .unwrap();
    table
        .start_with_deck(ALICE, "10", stacked(&[Ten, Seven, Ten, Two]))
        .await
        .unwrap();

    let err = table
        .act(press(ALICE, first.handle, ActionKind::Hit))
        .await
        .unwrap_err();
    assert_eq!(err, ActionError::Stale);
    assert_eq!(table.ledger().adds(), 1);
}

#[tokio::test(start_paused = true)]
async fn idle_round_is_reaped_and_later_press_is_stale() {
    let table = table();
    let shown = table
        .start_with_deck(ALICE, "100", stacked(&[Ten, Seven, Ten, Two]))
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(10)).await;
    assert_eq!(table.reap_idle().await, 0);

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(table.reap_idle().await, 1);
    assert_eq!(balance(&table, ALICE).await, BigInt::from(900));
    assert!(table.renderer().last().fields[2].value.starts_with("Timed out"));

    tokio::time::advance(Duration::from_millis(500)).await;
    let err = table
        .act(press(ALICE, shown.handle, ActionKind::Hit))
        .await
        .unwrap_err();
    assert_eq!(err, ActionError::Stale);
    assert_eq!(table.ledger().adds(), 1);
}

#[tokio::test(start_paused = true)]
async fn actions_keep_a_round_alive() {
    let table = table();
    let shown = table
        .start_with_deck(ALICE, "100", stacked(&[Ten, Seven, Two, Three, Two]))
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(8)).await;
    table
        .act(press(ALICE, shown.handle, ActionKind::Hit))
        .await
        .unwrap();
    tokio::time::advance(Duration::from_secs(8)).await;
    assert_eq!(table.reap_idle().await, 0);
    assert_eq!(table.live_sessions(), 1);
}

#[tokio::test(start_paused = true)]
async fn reaper_task_runs_until_stopped() {
    let table = Arc::new(table());
    table
        .start_with_deck(ALICE, "100", stacked(&[Ten, Seven, Ten, Two]))
        .await
        .unwrap();

    let reaper = Reaper::start(Arc::clone(&table));
    assert!(reaper.is_running());
    tokio::time::sleep(Duration::from_secs(12)).await;

    assert_eq!(table.live_sessions(), 0);
    assert_eq!(balance(&table, ALICE).await, BigInt::from(900));
    reaper.stop().await;
}

#[tokio::test(start_paused = true)]
async fn zero_reap_interval_keeps_the_reaper_alive() {
    let options = TableOptions {
        reap_interval: Duration::ZERO,
        idle_timeout: Duration::from_secs(1),
        ..TableOptions::default()
    };
    let table = Arc::new(Table::new(options, Counting::new(), Recorder::default(), 7));
    table
        .start_with_deck(ALICE, "100", stacked(&[Ten, Seven, Ten, Two]))
        .await
        .unwrap();

    let reaper = Reaper::start(Arc::clone(&table));
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert!(reaper.is_running());
    assert_eq!(table.live_sessions(), 0);
    assert_eq!(balance(&table, ALICE).await, BigInt::from(900));
    reaper.stop().await;
}

#[tokio::test(start_paused = true)]
async fn stand_racing_reap_settles_once() {
    let table = table();
    let shown = table
        .start_with_deck(ALICE, "100", stacked(&[Ten, Six, Ten, Nine, Two]))
        .await
        .unwrap();
    tokio::time::advance(Duration::from_secs(11)).await;

    let (pressed, reaped) = tokio::join!(
        table.act(press(ALICE, shown.handle, ActionKind::Stand)),
        table.reap_idle(),
    );

    assert_eq!(table.ledger().adds(), 1);
    let after = balance(&table, ALICE).await;
    match pressed {
        Ok(_) => {
            assert_eq!(reaped, 0);
            assert_eq!(after, BigInt::from(1100));
        }
        Err(err) => {
            assert_eq!(err, ActionError::Stale);
            assert_eq!(reaped, 1);
            assert_eq!(after, BigInt::from(900));
        }
    }
}

#[tokio::test(start_paused = true)]
async fn reap_winning_the_race_makes_the_press_stale() {
    let table = table();
    let shown = table
        .start_with_deck(ALICE, "100", stacked(&[Ten, Six, Ten, Nine, Two]))
        .await
        .unwrap();
    tokio::time::advance(Duration::from_secs(11)).await;

    let (reaped, pressed) = tokio::join!(
        table.reap_idle(),
        table.act(press(ALICE, shown.handle, ActionKind::Stand)),
    );

    assert_eq!(reaped, 1);
    assert_eq!(pressed.unwrap_err(), ActionError::Stale);
    assert_eq!(table.ledger().adds(), 1);
    assert_eq!(balance(&table, ALICE).await, BigInt::from(900));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_presses_settle_once() {
    let table = Arc::new(table());
    let shown = table
        .start_with_deck(ALICE, "100", stacked(&[Ten, Six, Ten, Nine, Two]))
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let table = Arc::clone(&table);
        tasks.push(tokio::spawn(async move {
            table
                .act(press(ALICE, shown.handle, ActionKind::Stand))
                .await
                .is_ok()
        }));
    }
    let mut winners = 0;
    for task in tasks {
        if task.await.unwrap() {
            winners += 1;
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(table.ledger().adds(), 1);
    assert_eq!(balance(&table, ALICE).await, BigInt::from(1100));
}

#[tokio::test]
async fn render_failure_keeps_settlement() {
    let table = table_with(Counting::new(), Recorder::failing());
    table
        .start_with_deck(ALICE, "100", stacked(&[Ten, Seven, Ace, King]))
        .await
        .unwrap();

    assert_eq!(table.renderer().count(), 1);
    assert_eq!(balance(&table, ALICE).await, BigInt::from(1200));
}

#[tokio::test]
async fn ledger_failure_closes_the_round() {
    let table = table_with(Counting::broken(), Recorder::default());
    let shown = table
        .start_with_deck(ALICE, "100", stacked(&[Ten, Seven, Ten, Two]))
        .await
        .unwrap();

    let err = table
        .act(press(ALICE, shown.handle, ActionKind::Forfeit))
        .await
        .unwrap_err();
    assert!(matches!(err, ActionError::Ledger(_)));
    assert_eq!(table.live_sessions(), 0);
    assert_eq!(balance(&table, ALICE).await, BigInt::from(1000));
}

#[tokio::test]
async fn players_play_independently() {
    let table = table();
    let a = table
        .start_with_deck(ALICE, "100", stacked(&[Ten, Seven, Ten, Two]))
        .await
        .unwrap();
    let b = table
        .start_with_deck(BOB, "100", stacked(&[Ten, Seven, Ten, Two]))
        .await
        .unwrap();
    assert_ne!(a.handle, b.handle);
    assert_eq!(table.live_sessions(), 2);

    table
        .act(press(BOB, b.handle, ActionKind::Forfeit))
        .await
        .unwrap();
    assert!(table.session_view(ALICE).await.is_some());
    assert!(table.session_view(BOB).await.is_none());
    assert_eq!(balance(&table, ALICE).await, BigInt::from(1000));
    assert_eq!(balance(&table, BOB).await, BigInt::from(900));
}

#[tokio::test]
async fn daily_supply_once_per_day() {
    let table = table();
    let morning = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    let midnight = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();

    let claim = table.claim_daily_at(ALICE, &morning).await.unwrap();
    assert_eq!(claim.balance, BigInt::from(1100));
    assert_eq!(claim.next_claim, midnight.timestamp());

    let evening = Utc.with_ymd_and_hms(2024, 5, 1, 23, 59, 0).unwrap();
    let err = table.claim_daily_at(ALICE, &evening).await.unwrap_err();
    assert_eq!(
        err,
        DailyError::AlreadyClaimed {
            next_claim: midnight.timestamp()
        }
    );
    assert_eq!(err.class(), ErrorClass::Conflict);

    let claim = table.claim_daily_at(ALICE, &midnight).await.unwrap();
    assert_eq!(claim.balance, BigInt::from(1200));
    assert_eq!(balance(&table, BOB).await, BigInt::from(1000));
}

#[tokio::test]
async fn daily_lock_ends_at_local_midnight() {
    let table = table();
    let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
    let late = tokyo.with_ymd_and_hms(2024, 5, 1, 23, 0, 0).unwrap();
    let claim = table.claim_daily_at(ALICE, &late).await.unwrap();
    assert_eq!(claim.next_claim, late.timestamp() + 3600);

    let eve = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
    let claim = table.claim_daily_at(BOB, &eve).await.unwrap();
    assert_eq!(claim.next_claim, eve.timestamp() + 1);
}

#[tokio::test]
async fn leaderboard_pages_through_richest_players() {
    let table = table();
    for id in 1..=23 {
        table
            .ledger()
            .set(PlayerId(id), BigInt::from(id * 10))
            .await
            .unwrap();
    }

    let first = table.leaderboard(1).await.unwrap();
    assert_eq!(first.pages, 3);
    assert_eq!(first.entries.len(), 10);
    assert_eq!(first.entries[0].player, PlayerId(23));
    assert_eq!(first.entries[0].rank, 1);

    let last = table.leaderboard(3).await.unwrap();
    let ranks: Vec<_> = last.entries.iter().map(|entry| entry.rank).collect();
    assert_eq!(ranks, [21, 22, 23]);
    assert_eq!(last.entries[2].balance, BigInt::from(10));

    let err = table.leaderboard(4).await.unwrap_err();
    assert_eq!(err, LeaderboardError::PageOutOfRange { page: 4, pages: 3 });
    assert_eq!(err.class(), ErrorClass::UserInput);
    assert!(table.leaderboard(0).await.is_err());
}

#[tokio::test]
async fn empty_leaderboard_has_one_page() {
    let table = table();
    let page = table.leaderboard(1).await.unwrap();
    assert_eq!(page.pages, 1);
    assert!(page.entries.is_empty());
}
