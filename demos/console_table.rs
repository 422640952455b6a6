//! Console table: plays rounds from stdin the way a chat transport would.

extern crate alloc;

use alloc::sync::Arc;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use bjtable::{
    ActionEvent, ActionKind, ColorState, MemoryLedger, MessageHandle, PlayerId, Reaper,
    RenderRequest, Renderer, Table, TableOptions, TransportError,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Prints each message and remembers the last one shown per player.
#[derive(Default)]
struct Console {
    last: Mutex<Vec<(PlayerId, MessageHandle)>>,
}

impl Console {
    fn handle_of(&self, player: PlayerId) -> Option<MessageHandle> {
        self.last
            .lock()
            .ok()?
            .iter()
            .rev()
            .find(|(owner, _)| *owner == player)
            .map(|(_, handle)| *handle)
    }
}

impl Renderer for Console {
    async fn render(&self, request: RenderRequest) -> Result<(), TransportError> {
        if let Ok(mut last) = self.last.lock() {
            last.retain(|(owner, _)| *owner != request.owner);
            last.push((request.owner, request.handle));
        }

        println!(
            "\n{} {} for player {}",
            colorize(&request.title, request.color),
            request.handle,
            request.owner
        );
        for field in &request.fields {
            println!("  {}: {}", field.name, field.value.replace('\n', "\n    "));
        }
        if !request.controls.is_empty() {
            println!("  [h]it [s]tand [f]orfeit");
        }
        let _ = io::stdout().flush();
        Ok(())
    }
}

fn colorize(text: &str, color: ColorState) -> String {
    let rgb = color.rgb();
    let (r, g, b) = ((rgb >> 16) & 0xff, (rgb >> 8) & 0xff, rgb & 0xff);
    format!("\u{1b}[38;2;{r};{g};{b}m{text}\u{1b}[0m")
}

fn prompt(player: PlayerId) {
    print!("player {player}> ");
    let _ = io::stdout().flush();
}

#[tokio::main]
async fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    println!("Blackjack console (bj <bet>, h, s, f, bal, daily, top [page], as <player>, q)");

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let options = TableOptions::from_env();
    let ledger = MemoryLedger::new(options.starting_balance.clone());
    let table = Arc::new(Table::new(options, ledger, Console::default(), seed));
    let reaper = Reaper::start(Arc::clone(&table));

    let mut player = PlayerId(1);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt(player);

    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            prompt(player);
            continue;
        };

        match command.to_ascii_lowercase().as_str() {
            "q" | "quit" => break,
            "bal" | "balance" => match table.balance(player).await {
                Ok(balance) => println!("Balance: {balance}"),
                Err(err) => println!("Ledger error: {err}"),
            },
            "daily" => match table.claim_daily(player).await {
                Ok(claim) => println!(
                    "Claimed your daily supply. Balance: {} (next claim at {})",
                    claim.balance, claim.next_claim
                ),
                Err(err) => println!("{err}"),
            },
            "top" => {
                let page = words.next().and_then(|n| n.parse().ok()).unwrap_or(1);
                match table.leaderboard(page).await {
                    Ok(board) => {
                        println!("Leaderboard {}/{}", board.page, board.pages);
                        for entry in board.entries {
                            println!("  {}: player {} -> {}", entry.rank, entry.player, entry.balance);
                        }
                    }
                    Err(err) => println!("{err}"),
                }
            }
            "as" => match words.next().and_then(|id| id.parse().ok()) {
                Some(id) => player = PlayerId(id),
                None => println!("Usage: as <player id>"),
            },
            "bj" | "blackjack" => {
                let bet = words.next().unwrap_or("");
                if let Err(err) = table.start(player, bet).await {
                    println!("Cannot start ({:?}): {err}", err.class());
                }
            }
            other => match other.parse::<ActionKind>() {
                Ok(kind) => {
                    let Some(message) = table.renderer().handle_of(player) else {
                        println!("No game on screen.");
                        prompt(player);
                        continue;
                    };
                    let event = ActionEvent {
                        player,
                        message,
                        kind,
                    };
                    if let Err(err) = table.act(event).await {
                        println!("Action rejected ({:?}): {err}", err.class());
                    }
                }
                Err(err) => println!("{err}: {other}"),
            },
        }
        prompt(player);
    }

    reaper.stop().await;
    println!("Goodbye.");
    Ok(())
}
