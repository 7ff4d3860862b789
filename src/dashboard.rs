//! Dashboard service — home-page counters and the monthly calendar view.
//!
//! Presentation renders these directly; the logic here is deliberately
//! read-only, like the recommender.

use chrono::{Datelike, NaiveDate};
use rusqlite::params;
use serde::Serialize;
use thiserror::Error;

use crate::db::contacts::DATE_FMT;
use crate::db::{ContactDb, DbError};

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Invalid month: {0}")]
    InvalidMonth(u32),
}

/// Home-page counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_contacts: i64,
    pub completed_contacts: i64,
    pub total_touches: i64,
}

/// One day cell in the calendar grid.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub day: u32,
    pub date: String,
    pub has_touch: bool,
}

/// A month of calendar cells plus navigation targets.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    /// Empty leading cells before day 1 (week starts Monday).
    pub placeholders: u32,
    pub days: Vec<CalendarDay>,
    pub prev_year: i32,
    pub prev_month: u32,
    pub next_year: i32,
    pub next_month: u32,
}

/// Load the home-page counters for a user.
pub fn dashboard_stats(db: &ContactDb, user_id: &str) -> Result<DashboardStats, DashboardError> {
    let total_contacts = db.count_contacts(user_id)?;
    let completed_contacts: i64 = db
        .conn_ref()
        .query_row(
            "SELECT COUNT(*) FROM contacts WHERE user_id = ?1 AND completed = 1",
            params![user_id],
            |row| row.get(0),
        )
        .map_err(DbError::Sqlite)?;
    let total_touches = db.count_touches(user_id)?;

    Ok(DashboardStats {
        total_contacts,
        completed_contacts,
        total_touches,
    })
}

/// Build the calendar grid for one month, marking days with recorded touches.
/// Touch lookups are one range query for the whole month, not per-day.
pub fn calendar_month(
    db: &ContactDb,
    user_id: &str,
    year: i32,
    month: u32,
) -> Result<CalendarMonth, DashboardError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or(DashboardError::InvalidMonth(month))?;
    let last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))
        .ok_or(DashboardError::InvalidMonth(month))?;

    let touched = db.touch_dates_in_range(user_id, first, last)?;

    let days = (1..=last.day())
        .map(|day| {
            let date = first.with_day(day).unwrap_or(first).format(DATE_FMT).to_string();
            let has_touch = touched.contains(&date);
            CalendarDay { day, date, has_touch }
        })
        .collect();

    let (prev_year, prev_month) = if month > 1 { (year, month - 1) } else { (year - 1, 12) };
    let (next_year, next_month) = if month < 12 { (year, month + 1) } else { (year + 1, 1) };

    Ok(CalendarMonth {
        year,
        month,
        month_name: first.format("%B").to_string(),
        placeholders: first.weekday().num_days_from_monday(),
        days,
        prev_year,
        prev_month,
        next_year,
        next_month,
    })
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month < 12 {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    };
    match (next, NaiveDate::from_ymd_opt(year, month, 1)) {
        (Some(next), Some(first)) => (next - first).num_days() as u32,
        _ => 0,
    }
}

// =============================================================================
// Tests
// =============================================================================
