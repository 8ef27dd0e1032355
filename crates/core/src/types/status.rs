//! Order status state machine.
//!
//! The status of an order is a closed enum rather than a free-form string, and
//! every status change goes through [`plan_transition`]. The planner decides
//! two things callers must not re-derive on their own:
//!
//! - whether the move is legal (terminal states accept no further changes), and
//! - whether the order is *entering* the shipped state, which drives the
//!   one-time `shipped_at` assignment and the at-most-once shipment email.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Fulfillment status of an order.
///
/// Serialized with the capitalized wire strings ("Pending", "Shipped", ...)
/// that the storefront and the orders table use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Paid for, not yet handed to a carrier.
    #[default]
    Pending,
    /// Handed to a carrier; `shipped_at` is set on first entry.
    Shipped,
    /// Confirmed delivered. Terminal.
    Delivered,
    /// Cancelled before delivery. Terminal.
    Cancelled,
}

impl OrderStatus {
    /// Returns true for statuses that accept no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// The wire string for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing an [`OrderStatus`] from its wire string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid order status: {0}")]
pub struct StatusParseError(pub String);

impl std::str::FromStr for OrderStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(StatusParseError(other.to_owned())),
        }
    }
}

/// A validated status change, ready to be applied by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPlan {
    /// The status the order will carry after the update.
    pub next: OrderStatus,
    /// True iff the order moves from a non-shipped status into `Shipped`.
    ///
    /// Saving `Shipped` over `Shipped` (e.g. a tracking-number correction)
    /// does not count as entering, so it never re-triggers the shipment
    /// email or touches `shipped_at`.
    pub entering_shipped: bool,
}

/// Error returned for an illegal status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("order is {from} and cannot change to {to}")]
pub struct TransitionError {
    /// Status the order currently holds.
    pub from: OrderStatus,
    /// Status the change asked for.
    pub to: OrderStatus,
}

/// Validate a proposed status change.
///
/// Non-terminal orders may move to any status, including back to one they
/// held before; terminal orders accept only a same-status re-save (a no-op
/// that still allows e.g. attaching a tracking number to a delivered order's
/// record).
///
/// # Errors
///
/// Returns [`TransitionError`] when `current` is terminal and `next` differs.
pub fn plan_transition(
    current: OrderStatus,
    next: OrderStatus,
) -> Result<TransitionPlan, TransitionError> {
    if current.is_terminal() && next != current {
        return Err(TransitionError {
            from: current,
            to: next,
        });
    }

    Ok(TransitionPlan {
        next,
        entering_shipped: current != OrderStatus::Shipped && next == OrderStatus::Shipped,
    })
}

// SQLx support (with postgres feature): stored as TEXT wire strings.
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for OrderStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OrderStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(s.parse()?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for OrderStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_string_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
        assert!("".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_strings() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Shipped).unwrap(),
            "\"Shipped\""
        );
        let parsed: OrderStatus = serde_json::from_str("\"Cancelled\"").unwrap();
        assert_eq!(parsed, OrderStatus::Cancelled);
    }

    #[test]
    fn test_pending_to_shipped_enters_shipped() {
        let plan = plan_transition(OrderStatus::Pending, OrderStatus::Shipped).unwrap();
        assert!(plan.entering_shipped);
        assert_eq!(plan.next, OrderStatus::Shipped);
    }

    #[test]
    fn test_shipped_resave_does_not_reenter() {
        // A tracking-number correction saves "Shipped" again: legal, but it
        // must not re-trigger the shipment email.
        let plan = plan_transition(OrderStatus::Shipped, OrderStatus::Shipped).unwrap();
        assert!(!plan.entering_shipped);
    }

    #[test]
    fn test_away_and_back_reenters_shipped() {
        // Shipped -> Pending -> Shipped: the second entry is an "entering"
        // move again; the ledger's sent-flag is what keeps the email single.
        let away = plan_transition(OrderStatus::Shipped, OrderStatus::Pending).unwrap();
        assert!(!away.entering_shipped);
        let back = plan_transition(OrderStatus::Pending, OrderStatus::Shipped).unwrap();
        assert!(back.entering_shipped);
    }

    #[test]
    fn test_terminal_states_reject_changes() {
        assert!(plan_transition(OrderStatus::Delivered, OrderStatus::Pending).is_err());
        assert!(plan_transition(OrderStatus::Cancelled, OrderStatus::Shipped).is_err());
        // Same-status re-save of a terminal order is a legal no-op.
        assert!(plan_transition(OrderStatus::Delivered, OrderStatus::Delivered).is_ok());
        assert!(plan_transition(OrderStatus::Cancelled, OrderStatus::Cancelled).is_ok());
    }

    #[test]
    fn test_non_terminal_moves_are_free() {
        assert!(plan_transition(OrderStatus::Pending, OrderStatus::Cancelled).is_ok());
        assert!(plan_transition(OrderStatus::Shipped, OrderStatus::Delivered).is_ok());
        assert!(plan_transition(OrderStatus::Shipped, OrderStatus::Cancelled).is_ok());
    }

    #[test]
    fn test_transition_error_message() {
        let err = plan_transition(OrderStatus::Delivered, OrderStatus::Pending).unwrap_err();
        assert_eq!(err.to_string(), "order is Delivered and cannot change to Pending");
    }
}
