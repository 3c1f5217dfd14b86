//! Canonical event types emitted by the parking reservation contract.
//!
//! These mirror the Soroban contract events defined in
//! `contracts/parking_reservation/src/events.rs` and
//! `contracts/parking_reservation/src/rbac.rs`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the parking reservation contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A spot was added (`spot_add` topic).
    SpotAdded,
    /// A spot's hourly price changed (`spot_upd` topic).
    SpotPriceUpdated,
    /// A spot entered or left maintenance (`spot_mnt` topic).
    SpotMaintenance,
    /// A spot was permanently withdrawn (`spot_off` topic).
    SpotDeactivated,
    /// The owner force-released a spot (`released` topic).
    SpotReleased,
    /// A user profile was created (`user_reg` topic).
    UserRegistered,
    /// Tokens were added to a deposit balance (`deposit` topic).
    BalanceDeposited,
    /// A deposit balance was paid out (`withdraw` topic).
    BalanceWithdrawn,
    /// A reservation was requested and its payment escrowed (`requested` topic).
    ReservationRequested,
    /// The gateway confirmed a reservation (`confirmed` topic).
    ReservationConfirmed,
    /// A reservation ran to completion (`completed` topic).
    ReservationCompleted,
    /// The user cancelled a reservation (`cancelled` topic).
    ReservationCancelled,
    /// A refund was transferred to the user (`refunded` topic).
    RefundIssued,
    /// A refund could not be transferred and was credited instead (`credited` topic).
    RefundCredited,
    /// A pending request was timed out (`timeout` topic).
    TimeoutTriggered,
    /// Platform revenue was withdrawn (`rev_out` topic).
    RevenueWithdrawn,
    /// A role was granted or replaced (`role_set` topic).
    RoleSet,
    /// A role was revoked (`role_del` topic).
    RoleDel,
    /// Protocol was paused (`paused` topic).
    ProtocolPaused,
    /// Protocol was unpaused (`unpaused` topic).
    ProtocolUnpaused,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

/// What the second topic of an event identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Spot,
    Reservation,
    User,
    Role,
    Protocol,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spot => "spot",
            Self::Reservation => "reservation",
            Self::User => "user",
            Self::Role => "role",
            Self::Protocol => "protocol",
        }
    }
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "spot_add" => Self::SpotAdded,
            "spot_upd" => Self::SpotPriceUpdated,
            "spot_mnt" => Self::SpotMaintenance,
            "spot_off" => Self::SpotDeactivated,
            "released" => Self::SpotReleased,
            "user_reg" => Self::UserRegistered,
            "deposit" => Self::BalanceDeposited,
            "withdraw" => Self::BalanceWithdrawn,
            "requested" => Self::ReservationRequested,
            "confirmed" => Self::ReservationConfirmed,
            "completed" => Self::ReservationCompleted,
            "cancelled" => Self::ReservationCancelled,
            "refunded" => Self::RefundIssued,
            "credited" => Self::RefundCredited,
            "timeout" => Self::TimeoutTriggered,
            "rev_out" => Self::RevenueWithdrawn,
            "role_set" => Self::RoleSet,
            "role_del" => Self::RoleDel,
            "paused" => Self::ProtocolPaused,
            "unpaused" => Self::ProtocolUnpaused,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SpotAdded => "spot_added",
            Self::SpotPriceUpdated => "spot_price_updated",
            Self::SpotMaintenance => "spot_maintenance",
            Self::SpotDeactivated => "spot_deactivated",
            Self::SpotReleased => "spot_released",
            Self::UserRegistered => "user_registered",
            Self::BalanceDeposited => "balance_deposited",
            Self::BalanceWithdrawn => "balance_withdrawn",
            Self::ReservationRequested => "reservation_requested",
            Self::ReservationConfirmed => "reservation_confirmed",
            Self::ReservationCompleted => "reservation_completed",
            Self::ReservationCancelled => "reservation_cancelled",
            Self::RefundIssued => "refund_issued",
            Self::RefundCredited => "refund_credited",
            Self::TimeoutTriggered => "timeout_triggered",
            Self::RevenueWithdrawn => "revenue_withdrawn",
            Self::RoleSet => "role_set",
            Self::RoleDel => "role_del",
            Self::ProtocolPaused => "protocol_paused",
            Self::ProtocolUnpaused => "protocol_unpaused",
            Self::Unknown => "unknown",
        }
    }

    /// The entity the event's second topic refers to, if any.
    ///
    /// Revenue withdrawals are keyed by the recipient address and so land
    /// under `user`; role events are keyed by the target address.
    pub fn entity(&self) -> Option<Entity> {
        match self {
            Self::SpotAdded
            | Self::SpotPriceUpdated
            | Self::SpotMaintenance
            | Self::SpotDeactivated
            | Self::SpotReleased => Some(Entity::Spot),
            Self::ReservationRequested
            | Self::ReservationConfirmed
            | Self::ReservationCompleted
            | Self::ReservationCancelled
            | Self::RefundIssued
            | Self::RefundCredited
            | Self::TimeoutTriggered => Some(Entity::Reservation),
            Self::UserRegistered
            | Self::BalanceDeposited
            | Self::BalanceWithdrawn
            | Self::RevenueWithdrawn => Some(Entity::User),
            Self::RoleSet | Self::RoleDel => Some(Entity::Role),
            Self::ProtocolPaused | Self::ProtocolUnpaused => Some(Entity::Protocol),
            Self::Unknown => None,
        }
    }
}

/// A fully decoded contract event, ready to be stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkingEvent {
    pub event_type: String,
    pub entity: Option<String>,
    pub entity_id: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_type: String,
    pub entity: Option<String>,
    pub entity_id: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}
