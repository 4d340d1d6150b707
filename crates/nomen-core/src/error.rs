use crate::types::{Balance, Timestamp};
use thiserror::Error;

/// The complete error taxonomy of the registration core.
///
/// Every mutating operation either applies all of its effects or returns one
/// of these with zero observable state change; callers own all retries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    // ── Authorization ────────────────────────────────────────────────────────
    #[error("caller is not authorized for this operation")]
    Unauthorized,

    #[error("only the previous registrar may transfer auctioned names")]
    OnlyPreviousRegistrar,

    // ── Availability / lifecycle ─────────────────────────────────────────────
    #[error("name is already registered and not expired")]
    Unavailable,

    #[error("name is expired or was never registered; renewal cannot resurrect it")]
    NameExpired,

    #[error("owner query for nonexistent name")]
    NonexistentToken,

    #[error("owner query for expired name")]
    Expired,

    #[error("registrations open at {opens_at}; migration period still running")]
    RegistrationNotOpen { opens_at: Timestamp },

    // ── Commit-reveal ────────────────────────────────────────────────────────
    #[error("no commitment found")]
    NoCommitmentFound,

    #[error("commitment already exists")]
    CommitmentExists,

    // ── Validation ───────────────────────────────────────────────────────────
    #[error("duration must be greater than zero")]
    ZeroDuration,

    #[error("the zero address cannot own names")]
    ZeroAddress,

    #[error("names shorter than {min} characters are not available")]
    NameTooShort { min: usize },

    // ── Arithmetic ───────────────────────────────────────────────────────────
    #[error("addition overflow")]
    AdditionOverflow,

    #[error("multiplication overflow")]
    MultiplicationOverflow,

    // ── Payment ──────────────────────────────────────────────────────────────
    #[error("insufficient payment: need {need} base units, have {have}")]
    InsufficientPayment { need: Balance, have: Balance },

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),
}
