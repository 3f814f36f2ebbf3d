use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A person in the network. `is_me` marks the owner account — the single
/// row with credentials. Everything else is a tracked contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub sector: Option<String>,
    pub is_me: bool,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub how_i_know_them: Option<String>,
    pub when_i_met_them: Option<String>,
    pub notes: Option<String>,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Undirected edge between two users. Endpoints are stored canonically
/// with `person1_id < person2_id`, so (a, b) and (b, a) are the same edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub id: i64,
    pub person1_id: i64,
    pub person2_id: i64,
    pub relationship: Option<String>,
    pub strength: Option<i64>,
    pub context: Option<String>,
    pub last_interaction: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Referral {
    pub id: i64,
    pub referrer_id: i64,
    pub company: Option<String>,
    pub position: Option<String>,
    pub application_date: Option<String>,
    pub interview_date: Option<String>,
    pub status: ReferralStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Reminder tied to a specific connection between the owner and a contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUp {
    pub id: i64,
    pub user_id: i64,
    pub contact_user_id: i64,
    pub connection_id: i64,
    pub status: FollowUpStatus,
    pub due_date: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Referral outcome. No transition rules are enforced — any status may be
/// written at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferralStatus {
    Pending,
    Rejected,
    Offered,
    Accepted,
}

impl ReferralStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralStatus::Pending => "pending",
            ReferralStatus::Rejected => "rejected",
            ReferralStatus::Offered => "offered",
            ReferralStatus::Accepted => "accepted",
        }
    }
}

impl Default for ReferralStatus {
    fn default() -> Self {
        ReferralStatus::Pending
    }
}

impl fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferralStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReferralStatus::Pending),
            "rejected" => Ok(ReferralStatus::Rejected),
            "offered" => Ok(ReferralStatus::Offered),
            "accepted" => Ok(ReferralStatus::Accepted),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowUpStatus {
    Pending,
    Completed,
    Skipped,
}

impl FollowUpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowUpStatus::Pending => "pending",
            FollowUpStatus::Completed => "completed",
            FollowUpStatus::Skipped => "skipped",
        }
    }
}

impl Default for FollowUpStatus {
    fn default() -> Self {
        FollowUpStatus::Pending
    }
}

impl fmt::Display for FollowUpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FollowUpStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FollowUpStatus::Pending),
            "completed" => Ok(FollowUpStatus::Completed),
            "skipped" => Ok(FollowUpStatus::Skipped),
            _ => Err(()),
        }
    }
}

/// Parse a timestamp stored by SQLite. `datetime('now')` writes
/// "YYYY-MM-DD HH:MM:SS" without a timezone, so fall back to naive UTC
/// when RFC 3339 parsing fails.
pub fn parse_timestamp(s: &str) -> DateTime<Utc> {
    s.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", s, e);
            DateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referral_status_round_trips() {
        for s in ["pending", "rejected", "offered", "accepted"] {
            let parsed: ReferralStatus = s.parse().unwrap();
            assert_eq!(parsed.as_str(), s);
        }
        assert!("hired".parse::<ReferralStatus>().is_err());
    }

    #[test]
    fn follow_up_status_round_trips() {
        for s in ["pending", "completed", "skipped"] {
            let parsed: FollowUpStatus = s.parse().unwrap();
            assert_eq!(parsed.as_str(), s);
        }
        assert!("done".parse::<FollowUpStatus>().is_err());
    }

    #[test]
    fn status_serde_uses_lowercase() {
        let json = serde_json::to_string(&ReferralStatus::Offered).unwrap();
        assert_eq!(json, "\"offered\"");
        let back: FollowUpStatus = serde_json::from_str("\"skipped\"").unwrap();
        assert_eq!(back, FollowUpStatus::Skipped);
    }

    #[test]
    fn parses_sqlite_and_rfc3339_timestamps() {
        let a = parse_timestamp("2025-06-01 12:30:00");
        let b = parse_timestamp("2025-06-01T12:30:00Z");
        assert_eq!(a, b);
    }
}
