//! Core types for Farmstand.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use status::{OrderStatus, StatusParseError, TransitionError, TransitionPlan, plan_transition};
