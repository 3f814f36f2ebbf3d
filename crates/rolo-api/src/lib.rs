pub mod auth;
pub mod connections;
pub mod error;
pub mod follow_ups;
pub mod middleware;
pub mod referrals;
pub mod users;
