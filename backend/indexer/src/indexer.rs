//! Long-running background task that polls the Soroban RPC and writes
//! decoded distribution events to the database.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::db;
use crate::errors::Result;
use crate::rpc;

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
}

/// Where the next poll starts.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Position {
    ledger: u32,
    cursor: Option<String>,
}

/// Run the indexer loop until `shutdown` is cancelled.
pub async fn run(state: Arc<IndexerState>, shutdown: CancellationToken) {
    info!("Indexer starting — contract: {}", state.config.contract_id);

    // Load the cursor from the DB; fall back to config start_ledger.
    let last_ledger = db::get_last_ledger(&state.pool).await.unwrap_or(0);
    let cursor = db::get_cursor_string(&state.pool).await.unwrap_or(None);

    let mut position = Position {
        ledger: resume_ledger(last_ledger, state.config.start_ledger),
        cursor,
    };

    info!("Resuming from ledger {}", position.ledger);

    loop {
        match poll_once(&state, &position, &shutdown).await {
            Ok(Some(next)) => position = next,
            Ok(None) => break,
            Err(e) => error!("Indexer poll error: {e}"),
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(Duration::from_secs(state.config.poll_interval_secs)) => {}
        }
    }

    info!("Indexer stopped at ledger {}", position.ledger);
}

fn resume_ledger(saved: i64, configured: u32) -> u32 {
    if saved > 0 {
        u32::try_from(saved).unwrap_or(u32::MAX)
    } else {
        configured
    }
}

/// Perform a single poll iteration.
///
/// Returns the next position, or `None` when cancelled mid-poll.
async fn poll_once(
    state: &IndexerState,
    position: &Position,
    shutdown: &CancellationToken,
) -> Result<Option<Position>> {
    let config = &state.config;
    let Some(page) = rpc::fetch_events(
        &state.client,
        &config.rpc_url,
        &config.contract_id,
        position.ledger,
        position.cursor.as_deref(),
        config.events_per_page,
        shutdown,
    )
    .await?
    else {
        return Ok(None);
    };

    if !page.events.is_empty() {
        let decoded = rpc::decode_events(&page.events, &config.contract_id);
        let inserted = db::insert_events(&state.pool, &decoded).await?;
        info!(
            "Polled {} raw events → {} new records stored",
            page.events.len(),
            inserted
        );
    }

    let next = advance(position.ledger, page.cursor, page.latest_ledger);

    // Persist cursor so restarts are deterministic.
    db::save_cursor(&state.pool, next.ledger as i64, next.cursor.as_deref()).await?;

    Ok(Some(next))
}

/// The ledger never moves backwards; a pagination cursor, when present,
/// takes precedence over the ledger on the next request.
fn advance(start_ledger: u32, cursor: Option<String>, latest_ledger: Option<u64>) -> Position {
    let ledger = latest_ledger
        .map(|l| u32::try_from(l).unwrap_or(u32::MAX).max(start_ledger))
        .unwrap_or(start_ledger);
    Position { ledger, cursor }
}
