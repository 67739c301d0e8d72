//! # deckforge
//!
//! Line-oriented slide-deck editor over `deckforge-engine`.
//!
//! `deckforge [deck-id]` opens the given deck, or resumes the last active one.
//! Changes are autosaved after a quiet period and on `quit`; `present` prints
//! the deck through the terminal renderer.

mod commands;
mod error;
mod terminal;

use std::sync::Arc;

use deckforge_engine::{DeckEngine, EngineConfig, EngineEvent};
use deckforge_shared::DeckId;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::commands::{execute, Command, HELP};
use crate::terminal::TerminalPresenter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("deckforge_cli=info,deckforge_engine=debug,deckforge_store=info,warn")
        }))
        .init();

    info!("Starting deckforge v{}", env!("CARGO_PKG_VERSION"));

    let config = EngineConfig::from_env();
    info!(?config, "Loaded configuration");

    let deck_id = std::env::args().nth(1).map(|s| DeckId::parse(&s)).transpose()?;
    let engine = DeckEngine::from_config(config, Arc::new(TerminalPresenter::new()), deck_id)?;
    info!(deck = %engine.deck_id(), "deck ready");

    let mut events = engine.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(EngineEvent::Saved { deck_id }) => debug!(deck = %deck_id, "autosaved"),
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    });

    println!("{HELP}");
    print!("{}", execute(&engine, Command::List).await?);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                None
            }
        };
        let Some(line) = line else { break };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        print!("{}", execute(&engine, command).await?);
    }

    engine.close().await;
    Ok(())
}
