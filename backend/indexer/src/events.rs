//! Canonical event types emitted by the pledge distribution contract.
//!
//! These mirror the Soroban contract events defined in
//! `contracts/pledge_distribution/src/events.rs`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the distribution contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A participant deposited during the pledge phase (`pledged` topic).
    Pledged,
    /// The pledge phase closed and the scaling ratio was fixed (`finalized` topic).
    Finalized,
    /// A participant was paid out and refunded (`allocated` topic).
    Allocated,
    /// One `process_batch` call finished (`batch` topic).
    BatchProcessed,
    /// The roster was fully processed (`complete` topic).
    DistributionCompleted,
    /// The emergency latch was set (`emergency` topic).
    EmergencyActivated,
    /// Funds were pulled out under the emergency latch (`em_wdraw` topic).
    EmergencyWithdrawal,
    /// Residual tokens were swept after completion (`recovered` topic).
    TokensRecovered,
    /// A participant was blacklisted or cleared (`blacklist` topic).
    BlacklistUpdated,
    /// Policy knobs changed (`policy` topic).
    PolicyUpdated,
    /// Participant operations were paused (`paused` topic).
    Paused,
    /// Participant operations resumed (`unpaused` topic).
    Unpaused,
    /// The admin role moved to a new address (`admin` topic).
    AdminTransferred,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    pub const ALL: [EventKind; 14] = [
        Self::Pledged,
        Self::Finalized,
        Self::Allocated,
        Self::BatchProcessed,
        Self::DistributionCompleted,
        Self::EmergencyActivated,
        Self::EmergencyWithdrawal,
        Self::TokensRecovered,
        Self::BlacklistUpdated,
        Self::PolicyUpdated,
        Self::Paused,
        Self::Unpaused,
        Self::AdminTransferred,
        Self::Unknown,
    ];

    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "pledged" => Self::Pledged,
            "finalized" => Self::Finalized,
            "allocated" => Self::Allocated,
            "batch" => Self::BatchProcessed,
            "complete" => Self::DistributionCompleted,
            "emergency" => Self::EmergencyActivated,
            "em_wdraw" => Self::EmergencyWithdrawal,
            "recovered" => Self::TokensRecovered,
            "blacklist" => Self::BlacklistUpdated,
            "policy" => Self::PolicyUpdated,
            "paused" => Self::Paused,
            "unpaused" => Self::Unpaused,
            "admin" => Self::AdminTransferred,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pledged => "pledged",
            Self::Finalized => "finalized",
            Self::Allocated => "allocated",
            Self::BatchProcessed => "batch_processed",
            Self::DistributionCompleted => "distribution_completed",
            Self::EmergencyActivated => "emergency_activated",
            Self::EmergencyWithdrawal => "emergency_withdrawal",
            Self::TokensRecovered => "tokens_recovered",
            Self::BlacklistUpdated => "blacklist_updated",
            Self::PolicyUpdated => "policy_updated",
            Self::Paused => "paused",
            Self::Unpaused => "unpaused",
            Self::AdminTransferred => "admin_transferred",
            Self::Unknown => "unknown",
        }
    }

    /// Inverse of [`EventKind::as_str`], used to validate API path segments.
    pub fn from_stored(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

/// A fully decoded distribution event, ready to be stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionEvent {
    /// RPC-assigned event id; the idempotency key.
    pub event_id: String,
    pub event_type: String,
    pub participant: Option<String>,
    pub actor: Option<String>,
    /// Primary quantity carried by the event.
    pub amount: Option<String>,
    /// Secondary value (running total, refund, ratio, token, flag).
    pub detail: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_id: String,
    pub event_type: String,
    pub participant: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub detail: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}

/// Per-participant view folded from indexed events.
///
/// Amounts are decimal strings so that `i128` values survive JSON clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantSummary {
    pub participant: String,
    pub deposits: u32,
    pub total_pledged: String,
    pub processed: bool,
    pub allocation: String,
    pub refund: String,
    pub blacklisted: bool,
    pub last_ledger: Option<i64>,
}

impl ParticipantSummary {
    /// Fold a participant's events (ledger order) into a summary.
    pub fn from_events(participant: &str, events: &[EventRecord]) -> Self {
        let mut deposits = 0u32;
        let mut total_pledged: i128 = 0;
        let mut processed = false;
        let mut allocation: i128 = 0;
        let mut refund: i128 = 0;
        let mut blacklisted = false;

        for ev in events {
            match EventKind::from_stored(&ev.event_type) {
                Some(EventKind::Pledged) => {
                    deposits += 1;
                    total_pledged = total_pledged.saturating_add(parse_amount(&ev.amount));
                }
                Some(EventKind::Allocated) => {
                    processed = true;
                    allocation = parse_amount(&ev.amount);
                    refund = parse_amount(&ev.detail);
                }
                Some(EventKind::BlacklistUpdated) => {
                    blacklisted = ev.detail.as_deref() == Some("true");
                }
                _ => {}
            }
        }

        Self {
            participant: participant.to_string(),
            deposits,
            total_pledged: total_pledged.to_string(),
            processed,
            allocation: allocation.to_string(),
            refund: refund.to_string(),
            blacklisted,
            last_ledger: events.iter().map(|e| e.ledger).max(),
        }
    }
}

fn parse_amount(raw: &Option<String>) -> i128 {
    raw.as_deref()
        .and_then(|s| s.trim().parse::<i128>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        kind: EventKind,
        ledger: i64,
        amount: Option<&str>,
        detail: Option<&str>,
    ) -> EventRecord {
        EventRecord {
            id: ledger,
            event_id: format!("ev-{ledger}"),
            event_type: kind.as_str().to_string(),
            participant: Some("GALICE".to_string()),
            actor: Some("GALICE".to_string()),
            amount: amount.map(String::from),
            detail: detail.map(String::from),
            ledger,
            timestamp: 0,
            contract_id: "CONTRACT1".to_string(),
            tx_hash: None,
            created_at: 0,
        }
    }

    #[test]
    fn stored_names_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_stored(kind.as_str()), Some(kind));
        }
        assert_eq!(EventKind::from_stored("project_funded"), None);
    }

    #[test]
    fn summary_folds_pledges_and_allocation() {
        let events = vec![
            record(EventKind::Pledged, 10, Some("2000000"), Some("2000000")),
            record(EventKind::Pledged, 12, Some("500000"), Some("2500000")),
            record(EventKind::Allocated, 20, Some("1000000"), Some("500000")),
        ];
        let summary = ParticipantSummary::from_events("GALICE", &events);
        assert_eq!(summary.deposits, 2);
        assert_eq!(summary.total_pledged, "2500000");
        assert!(summary.processed);
        assert_eq!(summary.allocation, "1000000");
        assert_eq!(summary.refund, "500000");
        assert!(!summary.blacklisted);
        assert_eq!(summary.last_ledger, Some(20));
    }

    #[test]
    fn summary_tracks_latest_blacklist_flag() {
        let events = vec![
            record(EventKind::Pledged, 10, Some("1000"), Some("1000")),
            record(EventKind::BlacklistUpdated, 11, None, Some("true")),
            record(EventKind::BlacklistUpdated, 14, None, Some("false")),
            record(EventKind::BlacklistUpdated, 15, None, Some("true")),
        ];
        let summary = ParticipantSummary::from_events("GALICE", &events);
        assert!(summary.blacklisted);
        assert!(!summary.processed);
        assert_eq!(summary.allocation, "0");
    }

    #[test]
    fn summary_of_unknown_participant_is_empty() {
        let summary = ParticipantSummary::from_events("GNOBODY", &[]);
        assert_eq!(summary.deposits, 0);
        assert_eq!(summary.total_pledged, "0");
        assert_eq!(summary.last_ledger, None);
    }
}
