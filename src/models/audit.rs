use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Approve => write!(f, "approve"),
            Decision::Reject => write!(f, "reject"),
        }
    }
}

/// Immutable audit log entry. Events are only ever listed, never changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: String,
    pub action_type: String,
    pub resource_id: String,
    pub user_id: String,
    pub decision: Decision,
    pub reason: String,
    #[serde(default)]
    pub ai_recommendation: Option<String>,
    pub ai_available: bool,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(with = "super::timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Aggregate decision counters, computed server-side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_actions: u64,
    pub approved_count: u64,
    pub rejected_count: u64,
    pub reject_rate: f64,
    pub ai_unavailable_count: u64,
}

/// Pagination and filtering for the event listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub user_id: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            user_id: None,
            limit: 100,
            offset: 0,
        }
    }
}

impl EventQuery {
    pub fn page(limit: u32, offset: u32) -> Self {
        Self {
            user_id: None,
            limit,
            offset,
        }
    }

    /// Query string pairs, in the order the API documents them
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(ref user_id) = self.user_id {
            pairs.push(("user_id", user_id.clone()));
        }
        pairs.push(("limit", self.limit.to_string()));
        pairs.push(("offset", self.offset.to_string()));
        pairs
    }
}
