/// ─── Nomen Registry Constants ───────────────────────────────────────────────
///
/// Time-bounded, transferable ownership of short string labels under a
/// single root node, priced per year in an 18-decimal payment token.

// ── Payment ──────────────────────────────────────────────────────────────────

/// One whole payment token in base units (18 decimals).
pub const PRICE_UNIT: u128 = 1_000_000_000_000_000_000;

// ── Time ─────────────────────────────────────────────────────────────────────

/// One registration year: 365 days, in seconds.
pub const SECONDS_PER_YEAR: i64 = 31_536_000;

/// Default minimum age a commitment must reach before it can be revealed.
pub const DEFAULT_MIN_COMMITMENT_AGE_SECS: i64 = 60;

// ── Name policy ──────────────────────────────────────────────────────────────

/// Default minimum label length. Shorter labels are locked out until the
/// administrator lowers the threshold.
pub const DEFAULT_MIN_NAME_LENGTH: usize = 5;
