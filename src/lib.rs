//! Followup Buddy — evangelism contact tracking with a single-answer
//! recommendation engine.
//!
//! The crate keeps contacts and their dated follow-up touches in a local
//! SQLite database and, from one aggregated snapshot per call, recommends
//! the next visit: an overdue contact first, then cadence maintenance, then
//! a gentle stagger of fresh contacts — or nothing, which means "go start a
//! new contact".

pub mod dashboard;
pub mod db;
pub mod migrations;
pub mod recommend;
pub mod seed;

pub use db::{ActiveContact, ContactDb, DbContact, DbError, DbTouch, FaithTier};
pub use recommend::{recommend, recommend_for, Reason, Recommendation, RecommenderConfig};
