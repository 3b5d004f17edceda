//! Entitlement policy — pure allow/deny decisions over a User snapshot.
//!
//! Every decision reads server-held user state fetched at decision time.
//! Client-supplied claims about role or entitlement are never consulted.

use crate::models::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The action is Pro-only. Callers surface this as an upgrade prompt,
    /// not a generic error.
    NotPro,
    /// Free-tier generation credits are exhausted.
    OutOfTokens,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// "Consume a generation": Pro users are unlimited; free users need at
/// least one token. When allowed and not Pro, the caller must charge
/// exactly one token as part of the same logical operation.
pub fn can_generate(user: &User) -> Decision {
    if user.is_pro || user.tokens > 0 {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::OutOfTokens)
    }
}

/// "Save a CV": Pro-only, regardless of remaining tokens.
pub fn can_save_cv(user: &User) -> Decision {
    if user.is_pro {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::NotPro)
    }
}

/// Token balance after a permitted generation. Pro balances are a display
/// sentinel and are never decremented.
pub fn tokens_after_generation(user: &User) -> i32 {
    if user.is_pro {
        user.tokens
    } else {
        user.tokens - 1
    }
}
