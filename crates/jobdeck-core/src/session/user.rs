//! The authenticated user record and capability checks.
//!
//! The record is replaced wholesale on login, refresh, and profile fetch;
//! nothing mutates it field by field. Capabilities are a pure function over
//! the record, not behavior attached to it.

use serde::{Deserialize, Serialize};

/// Account role as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employer,
    Candidate,
    Admin,
}

impl Role {
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Employer => "employer",
            Role::Candidate => "candidate",
            Role::Admin => "admin",
        }
    }
}

/// Subscription snapshot embedded in the user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Plan identifier: "free", "plus", or "pro".
    pub plan: String,
    pub active: bool,
    /// RFC 3339 expiry of the current billing period, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

/// Last-known user record, cached across restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub role: Role,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Subscription>,
}

/// Subscription-gated capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entitlement {
    /// Automatic application to matching postings.
    AutoApply,
    /// Profile pinned at the top of employer search results.
    FeaturedProfile,
}

/// Returns whether the user's subscription grants a capability.
///
/// An absent or inactive subscription grants nothing.
pub fn has_entitlement(user: &UserRecord, entitlement: Entitlement) -> bool {
    let Some(subscription) = user.subscription.as_ref() else {
        return false;
    };
    if !subscription.active {
        return false;
    }
    match entitlement {
        Entitlement::AutoApply => matches!(subscription.plan.as_str(), "plus" | "pro"),
        Entitlement::FeaturedProfile => subscription.plan == "pro",
    }
}
