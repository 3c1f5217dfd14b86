//! Soroban RPC client: polls `getEvents` and decodes parking reservation events.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC returns an error or rate-limit
//!   response, up to [`MAX_BACKOFF_SECS`] seconds.
//! * Transient network errors (connection reset, timeout) are retried silently.

use std::time::Duration;

use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{Entity, EventKind, ParkingEvent};

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

/// One event as returned by `getEvents` with `xdrFormat: "json"`.
///
/// Topics and value are ScVals in their JSON form, e.g. `{"symbol":"requested"}`,
/// `{"u64":"42"}` or `{"map":[{"key":{"symbol":"user"},"val":{"address":"G…"}}]}`.
#[derive(Debug, Deserialize, Clone)]
pub struct RawEvent {
    #[serde(rename = "topicJson", default)]
    pub topic: Vec<Value>,
    #[serde(rename = "valueJson", default)]
    pub value: Value,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
    #[serde(rename = "inSuccessfulContractCall")]
    pub in_successful_contract_call: Option<bool>,
}

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// One page of `getEvents` results.
#[derive(Debug)]
pub struct EventPage {
    pub events: Vec<RawEvent>,
    /// Opaque pagination cursor for the next page, if the RPC returned one.
    pub cursor: Option<String>,
    pub latest_ledger: Option<u64>,
}

/// Doubling retry delay, capped at [`MAX_BACKOFF_SECS`].
#[derive(Debug)]
struct Backoff {
    secs: u64,
}

impl Backoff {
    fn new() -> Self {
        Self {
            secs: INITIAL_BACKOFF_SECS,
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = Duration::from_secs(self.secs);
        self.secs = (self.secs * 2).min(MAX_BACKOFF_SECS);
        delay
    }
}

/// Fetch a page of events from the RPC.
///
/// * `start_ledger` is the ledger sequence to scan from (inclusive).
/// * `cursor` is the opaque pagination cursor from a previous page.
/// * `limit` caps the number of events returned.
///
/// Transport failures, rate limiting and soft RPC errors are retried with
/// back-off. Malformed requests are returned as [`IndexerError::Rpc`].
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<EventPage> {
    let mut backoff = Backoff::new();
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "getEvents",
        "params": build_params(contract_id, start_ledger, cursor, limit),
    });

    loop {
        let resp = match client.post(rpc_url).json(&request).send().await {
            Ok(resp) => resp,
            Err(e) => {
                let delay = backoff.next_delay();
                warn!("RPC request failed (will retry in {delay:?}): {e}");
                tokio::time::sleep(delay).await;
                continue;
            }
        };

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let delay = backoff.next_delay();
            warn!("Rate-limited by RPC (will retry in {delay:?})");
            tokio::time::sleep(delay).await;
            continue;
        }

        let body: RpcResponse = resp.json().await?;

        if let Some(err) = body.error {
            if is_hard_error(err.code) {
                return Err(IndexerError::Rpc {
                    code: err.code,
                    message: err.message,
                });
            }
            let delay = backoff.next_delay();
            warn!(
                "RPC soft error (will retry in {delay:?}): {} {}",
                err.code, err.message
            );
            tokio::time::sleep(delay).await;
            continue;
        }

        let result = body.result.ok_or_else(|| {
            IndexerError::EventParse("Empty result from getEvents".to_string())
        })?;

        debug!(
            "Fetched {} events (latest_ledger={:?})",
            result.events.len(),
            result.latest_ledger
        );

        return Ok(EventPage {
            events: result.events,
            cursor: result.cursor,
            latest_ledger: result.latest_ledger,
        });
    }
}

/// Invalid request / unknown method: retrying cannot help.
fn is_hard_error(code: i64) -> bool {
    code == -32600 || code == -32601
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
        },
        // Without this the RPC returns base64 XDR in `topic` / `value`.
        "xdrFormat": "json"
    });

    // The RPC rejects startLedger together with a cursor.
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

/// Decode a list of raw RPC events into [`ParkingEvent`] structs.
///
/// Events from failed contract calls are dropped: their writes were reverted.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<ParkingEvent> {
    raw.iter()
        .filter(|e| e.in_successful_contract_call != Some(false))
        .filter_map(|e| decode_single(e, contract_id))
        .collect()
}

fn decode_single(raw: &RawEvent, contract_id: &str) -> Option<ParkingEvent> {
    // Extract leading topic symbol to determine event type.
    let first_topic = raw.topic.first()?;
    let kind = EventKind::from_topic(extract_symbol(first_topic)?);
    let entity = kind.entity();

    let ledger = raw.ledger.unwrap_or(0) as i64;
    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);

    let entity_id = raw.topic.get(1).and_then(extract_scalar);

    let (mut actor, amount) = decode_data(&raw.value, kind);
    // Balance events carry the user only in the topic.
    if actor.is_none() && entity == Some(Entity::User) {
        actor = entity_id.clone();
    }

    Some(ParkingEvent {
        event_type: kind.as_str().to_string(),
        entity: entity.map(|e| e.as_str().to_string()),
        entity_id,
        actor,
        amount,
        ledger,
        timestamp,
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash: raw.tx_hash.clone(),
    })
}

/// Pull `(actor, amount)` out of the event value. Struct payloads arrive as
/// ScVal maps keyed by field symbol; bare payloads as a single ScVal.
fn decode_data(value: &Value, kind: EventKind) -> (Option<String>, Option<String>) {
    match kind {
        EventKind::SpotAdded => (
            extract_field(value, "operator"),
            extract_field(value, "price"),
        ),
        EventKind::SpotPriceUpdated => (None, extract_field(value, "new_price")),
        EventKind::SpotMaintenance => (None, None),
        EventKind::SpotReleased | EventKind::TimeoutTriggered => {
            (extract_field(value, "by"), None)
        }
        EventKind::UserRegistered => (extract_field(value, "user"), None),
        EventKind::BalanceDeposited
        | EventKind::BalanceWithdrawn
        | EventKind::RevenueWithdrawn => (None, extract_scalar(value)),
        EventKind::ReservationRequested
        | EventKind::RefundIssued
        | EventKind::RefundCredited => (
            extract_field(value, "user"),
            extract_field(value, "amount"),
        ),
        EventKind::ReservationConfirmed => {
            (extract_field(value, "user"), extract_field(value, "fee"))
        }
        EventKind::ReservationCompleted => (None, extract_field(value, "amount")),
        EventKind::ReservationCancelled => {
            (extract_field(value, "user"), extract_field(value, "refund"))
        }
        // For these the data is the acting address.
        EventKind::SpotDeactivated
        | EventKind::RoleSet
        | EventKind::RoleDel
        | EventKind::ProtocolPaused
        | EventKind::ProtocolUnpaused => (extract_scalar(value), None),
        EventKind::Unknown => (None, None),
    }
}

/// Look up `key` in an ScVal map and render its value.
fn extract_field(value: &Value, key: &str) -> Option<String> {
    value
        .get("map")?
        .as_array()?
        .iter()
        .find(|entry| entry.get("key").and_then(extract_symbol) == Some(key))
        .and_then(|entry| entry.get("val"))
        .and_then(extract_scalar)
}

/// Render a scalar ScVal (symbol, string, address, integer, bool) as text.
fn extract_scalar(value: &Value) -> Option<String> {
    let map = value.as_object()?;
    let (tag, inner) = map.iter().next()?;
    match tag.as_str() {
        "symbol" | "string" | "address" => inner.as_str().map(String::from),
        "bool" => inner.as_bool().map(|b| b.to_string()),
        "u32" | "i32" | "u64" | "i64" | "timepoint" | "duration" | "u128" | "i128" => {
            extract_int(inner)
        }
        _ => None,
    }
}

/// Integers come as JSON numbers or decimal strings; 128-bit values from
/// older RPC versions as `{"hi":…,"lo":…}` parts.
fn extract_int(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Object(parts) => {
            let hi = parts.get("hi").and_then(int_part::<i64>)?;
            let lo = parts.get("lo").and_then(int_part::<u64>)?;
            Some((((hi as i128) << 64) | lo as i128).to_string())
        }
        _ => None,
    }
}

fn int_part<T: std::str::FromStr>(value: &Value) -> Option<T> {
    match value {
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// The name of an ScVal symbol, e.g. `{"symbol":"requested"}`.
fn extract_symbol(value: &Value) -> Option<&str> {
    value.get("symbol")?.as_str()
}

/// Parse an ISO-8601 timestamp string into a Unix epoch (seconds).
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
