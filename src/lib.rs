//! Lead funnel: postal code gate, contact wizard and lead submission.

pub mod catalog;
pub mod config;
pub mod error;
pub mod gate;
pub mod locale;
pub mod messages;
pub mod phone;
pub mod referral;
pub mod routes;
pub mod session;
pub mod submission;
pub mod tracking;
pub mod wizard;
