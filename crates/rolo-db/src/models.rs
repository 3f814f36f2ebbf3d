//! Database row types — these map directly to SQLite rows.
//! Distinct from the rolo-types API models to keep the DB layer independent;
//! `into_model` bridges the two.

use tracing::warn;

use rolo_types::models::{
    Connection, FollowUp, FollowUpStatus, Referral, ReferralStatus, User, parse_timestamp,
};

#[derive(Debug)]
pub struct UserRow {
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
    pub password: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl UserRow {
    /// Password hash never leaves the DB layer.
    pub fn into_model(self) -> User {
        User {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            company: self.company,
            sector: self.sector,
            is_me: self.is_me,
            email: self.email,
            phone: self.phone,
            linkedin_url: self.linkedin_url,
            how_i_know_them: self.how_i_know_them,
            when_i_met_them: self.when_i_met_them,
            notes: self.notes,
            username: self.username,
            created_at: parse_timestamp(&self.created_at),
            updated_at: self.updated_at.as_deref().map(parse_timestamp),
        }
    }
}

#[derive(Debug)]
pub struct ConnectionRow {
    pub id: i64,
    pub person1_id: i64,
    pub person2_id: i64,
    pub relationship: Option<String>,
    pub strength: Option<i64>,
    pub context: Option<String>,
    pub last_interaction: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl ConnectionRow {
    pub fn into_model(self) -> Connection {
        Connection {
            id: self.id,
            person1_id: self.person1_id,
            person2_id: self.person2_id,
            relationship: self.relationship,
            strength: self.strength,
            context: self.context,
            last_interaction: self.last_interaction,
            notes: self.notes,
            created_at: parse_timestamp(&self.created_at),
            updated_at: self.updated_at.as_deref().map(parse_timestamp),
        }
    }
}

#[derive(Debug)]
pub struct ReferralRow {
    pub id: i64,
    pub referrer_id: i64,
    pub company: Option<String>,
    pub position: Option<String>,
    pub application_date: Option<String>,
    pub interview_date: Option<String>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl ReferralRow {
    pub fn into_model(self) -> Referral {
        let status = self.status.parse::<ReferralStatus>().unwrap_or_else(|_| {
            warn!("Corrupt referral status '{}' on row {}", self.status, self.id);
            ReferralStatus::Pending
        });
        Referral {
            id: self.id,
            referrer_id: self.referrer_id,
            company: self.company,
            position: self.position,
            application_date: self.application_date,
            interview_date: self.interview_date,
            status,
            notes: self.notes,
            created_at: parse_timestamp(&self.created_at),
            updated_at: self.updated_at.as_deref().map(parse_timestamp),
        }
    }
}

#[derive(Debug)]
pub struct FollowUpRow {
    pub id: i64,
    pub user_id: i64,
    pub contact_user_id: i64,
    pub connection_id: i64,
    pub status: String,
    pub due_date: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl FollowUpRow {
    pub fn into_model(self) -> FollowUp {
        let status = self.status.parse::<FollowUpStatus>().unwrap_or_else(|_| {
            warn!("Corrupt follow-up status '{}' on row {}", self.status, self.id);
            FollowUpStatus::Pending
        });
        FollowUp {
            id: self.id,
            user_id: self.user_id,
            contact_user_id: self.contact_user_id,
            connection_id: self.connection_id,
            status,
            due_date: self.due_date,
            notes: self.notes,
            created_at: parse_timestamp(&self.created_at),
            updated_at: self.updated_at.as_deref().map(parse_timestamp),
        }
    }
}
