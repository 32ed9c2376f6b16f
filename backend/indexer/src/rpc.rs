//! Soroban RPC client — polls `getEvents` and decodes distribution events.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC returns an error or rate-limit
//!   response, up to [`MAX_BACKOFF_SECS`] seconds.
//! * Transient network errors (connection reset, timeout) are retried silently.
//! * Back-off sleeps are cut short when the indexer is cancelled.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{DistributionEvent, EventKind};
use crate::xdr::ScVal;

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawEvent {
    /// Topic list, JSON-decoded or base64 XDR
    pub topic: Vec<String>,
    /// Event value / data
    pub value: Value,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub id: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
    #[serde(rename = "inSuccessfulContractCall")]
    pub in_successful_contract_call: Option<bool>,
    #[serde(rename = "pagingToken")]
    pub paging_token: Option<String>,
}

/// One page of `getEvents` output.
#[derive(Debug)]
pub struct EventsPage {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    pub latest_ledger: Option<u64>,
}

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// Fetch a page of events from the RPC.
///
/// * `start_ledger` — the ledger sequence to scan from (inclusive).
/// * `cursor`       — optional opaque pagination cursor from a previous response.
/// * `limit`        — maximum number of events to return.
///
/// Returns `Ok(None)` when `shutdown` fires while waiting to retry.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
    shutdown: &CancellationToken,
) -> Result<Option<EventsPage>> {
    let mut backoff = INITIAL_BACKOFF_SECS;

    loop {
        let params = build_params(contract_id, start_ledger, cursor, limit);

        let response = client
            .post(rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "getEvents",
                "params": params,
            }))
            .send()
            .await;

        let retry_reason = match response {
            Err(e) => format!("RPC request failed: {e}"),
            Ok(resp) if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                "Rate-limited by RPC".to_string()
            }
            Ok(resp) => {
                let body: RpcResponse = resp.json().await?;

                match body.error {
                    // Malformed request or unknown method will never succeed on retry.
                    Some(err) if is_hard_error(err.code) => {
                        return Err(IndexerError::Rpc {
                            code: err.code,
                            message: err.message,
                        });
                    }
                    Some(err) => format!("RPC soft error {}: {}", err.code, err.message),
                    None => {
                        let result = body.result.ok_or_else(|| {
                            IndexerError::EventParse("Empty result from getEvents".to_string())
                        })?;

                        debug!(
                            "Fetched {} events (latest_ledger={:?})",
                            result.events.len(),
                            result.latest_ledger
                        );

                        return Ok(Some(EventsPage {
                            events: result.events,
                            cursor: result.cursor,
                            latest_ledger: result.latest_ledger,
                        }));
                    }
                }
            }
        };

        warn!("{retry_reason} (will retry in {backoff}s)");
        tokio::select! {
            _ = shutdown.cancelled() => return Ok(None),
            _ = tokio::time::sleep(Duration::from_secs(backoff)) => {}
        }
        backoff = next_backoff(backoff);
    }
}

fn is_hard_error(code: i64) -> bool {
    code == -32600 || code == -32601
}

fn next_backoff(current: u64) -> u64 {
    (current * 2).min(MAX_BACKOFF_SECS)
}

fn build_params(contract_id: &str, start_ledger: u32, cursor: Option<&str>, limit: u32) -> Value {
    let mut params = json!({
        "filters": [
            {
                "type": "contract",
                "contractIds": [contract_id]
            }
        ],
        "pagination": {
            "limit": limit
        }
    });

    if let Some(cur) = cursor {
        params["pagination"]["cursor"] = json!(cur);
    } else {
        params["startLedger"] = json!(start_ledger);
    }

    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Decode a list of raw RPC events into [`DistributionEvent`] structs.
///
/// Events from failed contract calls are dropped; the host rolled them back.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<DistributionEvent> {
    raw.iter()
        .enumerate()
        .filter(|(_, e)| e.in_successful_contract_call != Some(false))
        .filter_map(|(i, e)| decode_single(e, contract_id, i))
        .collect()
}

fn decode_single(raw: &RawEvent, contract_id: &str, index: usize) -> Option<DistributionEvent> {
    // Extract leading topic symbol to determine event type.
    let first_topic = raw.topic.first()?;
    let kind = EventKind::from_topic(&extract_symbol(first_topic));

    let ledger = raw.ledger.unwrap_or(0) as i64;
    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);

    let participant = raw.topic.get(1).map(|t| extract_topic_value(t));
    let tx_hash = raw.tx_hash.as_deref().and_then(normalize_tx_hash);

    let event_id = raw
        .id
        .clone()
        .or_else(|| raw.paging_token.clone())
        .unwrap_or_else(|| {
            format!(
                "{ledger}:{}:{}:{index}",
                tx_hash.as_deref().unwrap_or("-"),
                kind.as_str()
            )
        });

    let value = normalize_value(&raw.value);
    let (actor, amount, detail) = decode_data(&value, kind);

    Some(DistributionEvent {
        event_id,
        event_type: kind.as_str().to_string(),
        participant,
        actor,
        amount,
        detail,
        ledger,
        timestamp,
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash,
    })
}

/// Pull apart the JSON `value` blob that Soroban returns for event data.
///
/// Returns `(actor, amount, detail)`.
fn decode_data(
    value: &Value,
    kind: EventKind,
) -> (Option<String>, Option<String>, Option<String>) {
    match kind {
        EventKind::Pledged => (
            extract_field(value, &["participant"]),
            extract_field(value, &["amount"]),
            extract_field(value, &["participant_total"]),
        ),
        EventKind::Finalized => (
            None,
            extract_field(value, &["total_deposited"]),
            extract_field(value, &["scaling_ratio_bps"]),
        ),
        EventKind::Allocated => (
            extract_field(value, &["participant"]),
            extract_field(value, &["allocation"]),
            extract_field(value, &["refund"]),
        ),
        EventKind::BatchProcessed => (
            None,
            extract_field(value, &["allocated"]),
            extract_field(value, &["end"]),
        ),
        EventKind::DistributionCompleted => (None, scalar(value), None),
        EventKind::EmergencyWithdrawal | EventKind::TokensRecovered => (
            extract_field(value, &["recipient"]),
            extract_field(value, &["amount"]),
            extract_field(value, &["token"]),
        ),
        EventKind::BlacklistUpdated => (
            extract_field(value, &["participant"]),
            None,
            extract_field(value, &["blacklisted"]),
        ),
        EventKind::PolicyUpdated => (None, None, Some(value.to_string())),
        EventKind::EmergencyActivated
        | EventKind::Paused
        | EventKind::Unpaused
        | EventKind::AdminTransferred => {
            // Data is the bare address of the caller (or the new admin).
            let actor = scalar(value).or_else(|| extract_field(value, &["address"]));
            (actor, None, None)
        }
        EventKind::Unknown => (None, None, None),
    }
}

fn extract_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        value
            .get(key)
            .and_then(scalar)
            .or_else(|| find_nested(value, key))
    })
}

fn find_nested(value: &Value, key: &str) -> Option<String> {
    if let Value::Object(map) = value {
        for (k, v) in map {
            if k == key {
                return scalar(v);
            }
            if let Some(found) = find_nested(v, key) {
                return Some(found);
            }
        }
    }
    None
}

/// Render a leaf value, unwrapping `{"type":…,"value":…}` envelopes.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => map.get("value").and_then(scalar),
        _ => None,
    }
}

/// Extract a Soroban Symbol from a topic entry.
/// The RPC may return `{"type":"symbol","value":"pledged"}`, base64 XDR or the raw string.
fn extract_symbol(raw: &str) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(raw) {
        if let Some(s) = v.get("value").and_then(|x| x.as_str()) {
            return s.to_string();
        }
    }
    if let Some(ScVal::Symbol(sym)) = ScVal::from_base64(raw) {
        return sym;
    }
    // Fallback: treat the raw string as the symbol
    raw.to_string()
}

/// Extract the participant from a topic entry: a JSON object, base64 XDR
/// (addresses come back as strkeys) or a raw string.
fn extract_topic_value(raw: &str) -> String {
    serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|v| v.get("value").and_then(scalar))
        .or_else(|| ScVal::from_base64(raw).and_then(|v| scalar(&v.to_json())))
        .unwrap_or_else(|| raw.to_string())
}

/// Event data arrives either JSON-decoded or as a base64 XDR string.
fn normalize_value(value: &Value) -> Value {
    match value {
        Value::String(s) => ScVal::from_base64(s)
            .map(|v| v.to_json())
            .unwrap_or_else(|| value.clone()),
        _ => value.clone(),
    }
}

/// Lowercase 32-byte hex hashes; anything else is kept verbatim.
fn normalize_tx_hash(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match hex::decode(trimmed) {
        Ok(bytes) if bytes.len() == 32 => Some(hex::encode(bytes)),
        _ => Some(trimmed.to_string()),
    }
}

/// Parse an ISO-8601 timestamp string into a Unix epoch (seconds).
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
