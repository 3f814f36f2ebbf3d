use serde::{Deserialize, Serialize};

use crate::models::{FollowUpStatus, ReferralStatus};

// -- JWT Claims --

/// JWT claims shared between token issuance and the auth middleware.
/// Canonical definition lives here in rolo-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: i64,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: i64,
    pub username: String,
    pub token: String,
}

// -- Users --

/// Payload for creating a contact row. Contacts carry no credentials;
/// the owner account is created through `/auth/register` instead.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub sector: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub how_i_know_them: Option<String>,
    pub when_i_met_them: Option<String>,
    pub notes: Option<String>,
}

/// Partial update — only supplied fields are written.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub sector: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub how_i_know_them: Option<String>,
    pub when_i_met_them: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FilterOptions {
    pub companies: Vec<String>,
    pub sectors: Vec<String>,
}

// -- Connections --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewConnection {
    pub person1_id: i64,
    pub person2_id: i64,
    pub relationship: Option<String>,
    pub strength: Option<i64>,
    pub context: Option<String>,
    pub last_interaction: Option<String>,
    pub notes: Option<String>,
}

/// Endpoints are immutable after creation; delete and recreate to rewire
/// an edge.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionUpdate {
    pub relationship: Option<String>,
    pub strength: Option<i64>,
    pub context: Option<String>,
    pub last_interaction: Option<String>,
    pub notes: Option<String>,
}

// -- Referrals --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewReferral {
    pub referrer_id: i64,
    pub company: Option<String>,
    pub position: Option<String>,
    pub application_date: Option<String>,
    pub interview_date: Option<String>,
    #[serde(default)]
    pub status: ReferralStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferralUpdate {
    pub company: Option<String>,
    pub position: Option<String>,
    pub application_date: Option<String>,
    pub interview_date: Option<String>,
    pub status: Option<ReferralStatus>,
    pub notes: Option<String>,
}

// -- Follow-ups --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewFollowUp {
    pub user_id: i64,
    pub contact_user_id: i64,
    pub connection_id: i64,
    #[serde(default)]
    pub status: FollowUpStatus,
    pub due_date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FollowUpUpdate {
    pub status: Option<FollowUpStatus>,
    pub due_date: Option<String>,
    pub notes: Option<String>,
}
