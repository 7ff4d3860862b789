//! Activity recommender.
//!
//! Given a snapshot of a user's active contacts, deterministically selects
//! the single next action: one contact to follow up with, or `None` meaning
//! "start a new contact". Pure read logic — nothing here mutates contacts or
//! touches, so repeated calls on an unchanged snapshot always agree.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::{ActiveContact, ContactDb, DbError};

/// Tunable thresholds for the recommender. Passed in explicitly so tests can
/// override them without shared state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommenderConfig {
    /// Touches at which a contact counts as complete and leaves the pool.
    pub followup_target: i64,
    /// Days since last touch beyond which a contact is overdue.
    pub followup_interval_days: i64,
    /// Days since last touch within which a contact is still "fresh".
    pub recent_touch_window: i64,
    /// Minimum gap before a contact is eligible for a repeat touch.
    pub min_days_before_second_touch: i64,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            followup_target: 7,
            followup_interval_days: 7,
            recent_touch_window: 2,
            min_days_before_second_touch: 1,
        }
    }
}

/// Why a contact was chosen. Carried on the recommendation for the UI and
/// for tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// Waited past the target interval without reaching the followup goal.
    OverdueFollowup,
    /// Steady-cadence nudge toward the target count.
    BuildCadence,
    /// Recently touched but advanced anyway to stagger progress.
    StaggerRecent,
}

impl Reason {
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::OverdueFollowup => "overdue_followup",
            Reason::BuildCadence => "build_cadence",
            Reason::StaggerRecent => "stagger_recent",
        }
    }
}

/// The selected next action: always a follow-up visit to one contact.
/// A `None` result from the recommender means "go start a new contact".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub contact: ActiveContact,
    pub reason: Reason,
}

#[derive(Debug)]
struct Candidate<'a> {
    contact: &'a ActiveContact,
    days_since_touch: i64,
}

/// Recommend the next activity for a user, reading one aggregated snapshot
/// from the database. Without an authenticated user there is nothing to
/// personalize, so the caller gets the "start a new contact" signal directly.
pub fn recommend_for(
    db: &ContactDb,
    user_id: Option<&str>,
    today: NaiveDate,
    config: &RecommenderConfig,
) -> Result<Option<Recommendation>, DbError> {
    let user_id = match user_id {
        Some(id) => id,
        None => return Ok(None),
    };
    let contacts = db.list_active_contacts(user_id)?;
    Ok(recommend(&contacts, today, config))
}

/// Recommend the next activity from a snapshot of active contacts.
///
/// Strategy:
/// 1. Contacts at or past the followup target are excluded up front.
/// 2. Remaining contacts land in exactly one bucket by days since last
///    touch: overdue (>= interval), cadence (past the recent window), or
///    stagger (fresh but past the minimum gap). Touched-today contacts are
///    not candidates at all.
/// 3. Buckets are drained in priority order — any overdue contact wins over
///    every cadence contact, any cadence over every stagger.
/// 4. If no bucket has a candidate, encourage a new contact. Whether the
///    distribution already looks healthy (average touches >= half the
///    target) changes nothing about the result today; it is only logged.
pub fn recommend(
    contacts: &[ActiveContact],
    today: NaiveDate,
    config: &RecommenderConfig,
) -> Option<Recommendation> {
    if contacts.is_empty() {
        return None;
    }

    let mut overdue: Vec<Candidate> = Vec::new();
    let mut cadence: Vec<Candidate> = Vec::new();
    let mut stagger: Vec<Candidate> = Vec::new();
    let mut total_touches = 0i64;

    for contact in contacts {
        total_touches += contact.touch_count;

        if contact.touch_count >= config.followup_target {
            continue;
        }

        // Future-dated records produce a negative delta; treat as touched today.
        let days_since_touch = (today - contact.last_touch_date).num_days().max(0);
        let candidate = Candidate {
            contact,
            days_since_touch,
        };

        if days_since_touch >= config.followup_interval_days {
            overdue.push(candidate);
        } else if days_since_touch >= config.min_days_before_second_touch
            && days_since_touch > config.recent_touch_window
        {
            cadence.push(candidate);
        } else if days_since_touch >= config.min_days_before_second_touch {
            stagger.push(candidate);
        }
        // else: touched today, not a candidate in any bucket
    }

    // Most overdue first, then highest priority, fewest touches, oldest contact.
    if !overdue.is_empty() {
        overdue.sort_by(|a, b| {
            b.days_since_touch
                .cmp(&a.days_since_touch)
                .then_with(|| a.contact.relevance.cmp(&b.contact.relevance))
                .then_with(|| a.contact.touch_count.cmp(&b.contact.touch_count))
                .then_with(|| by_age_then_id(a.contact, b.contact))
        });
        return Some(pick(&overdue[0], Reason::OverdueFollowup));
    }

    // Lowest progress first to keep the cadence even across contacts.
    if !cadence.is_empty() {
        cadence.sort_by(|a, b| {
            a.contact
                .touch_count
                .cmp(&b.contact.touch_count)
                .then_with(|| a.contact.relevance.cmp(&b.contact.relevance))
                .then_with(|| by_age_then_id(a.contact, b.contact))
        });
        return Some(pick(&cadence[0], Reason::BuildCadence));
    }

    // Everything is fresh: gently advance the lowest-progress contact that
    // was still touched at least the minimum gap ago.
    if !stagger.is_empty() {
        stagger.sort_by(|a, b| {
            a.contact
                .touch_count
                .cmp(&b.contact.touch_count)
                .then_with(|| b.days_since_touch.cmp(&a.days_since_touch))
                .then_with(|| a.contact.relevance.cmp(&b.contact.relevance))
                .then_with(|| by_age_then_id(a.contact, b.contact))
        });
        return Some(pick(&stagger[0], Reason::StaggerRecent));
    }

    // No candidate in any bucket. The healthy-distribution judgment does not
    // change the outcome (both paths encourage a new contact); keep it
    // observable without inventing a distinct signal.
    let avg_touches = total_touches as f64 / contacts.len() as f64;
    if avg_touches >= config.followup_target as f64 / 2.0 {
        log::debug!(
            "Distribution healthy (avg {:.1} touches across {} contacts), encouraging new contact",
            avg_touches,
            contacts.len()
        );
    } else {
        log::debug!(
            "No actionable contact today (avg {:.1} touches), encouraging new contact",
            avg_touches
        );
    }
    None
}

/// Shared trailing tie-break: oldest initial date first, then id ascending
/// so a full tie still resolves the same way on every call.
fn by_age_then_id(a: &ActiveContact, b: &ActiveContact) -> Ordering {
    a.initial_date
        .cmp(&b.initial_date)
        .then_with(|| a.id.cmp(&b.id))
}

fn pick(candidate: &Candidate, reason: Reason) -> Recommendation {
    Recommendation {
        contact: candidate.contact.clone(),
        reason,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn today() -> NaiveDate {
        date("2026-08-20")
    }

    fn contact(
        id: &str,
        initial: &str,
        relevance: i64,
        touch_count: i64,
        last_touch: &str,
    ) -> ActiveContact {
        ActiveContact {
            id: id.to_string(),
            name: format!("Contact {}", id),
            initial_date: date(initial),
            relevance,
            touch_count,
            last_touch_date: date(last_touch),
        }
    }

    fn config() -> RecommenderConfig {
        RecommenderConfig::default()
    }

    #[test]
    fn empty_snapshot_recommends_nothing() {
        assert!(recommend(&[], today(), &config()).is_none());
    }

    #[test]
    fn untouched_contact_past_interval_is_overdue() {
        // Initial date 10 days ago, no touches: 10 >= 7.
        let contacts = vec![contact("c1", "2026-08-10", 2, 0, "2026-08-10")];
        let rec = recommend(&contacts, today(), &config()).expect("recommendation");
        assert_eq!(rec.contact.id, "c1");
        assert_eq!(rec.reason, Reason::OverdueFollowup);
        assert_eq!(rec.reason.as_str(), "overdue_followup");
    }

    #[test]
    fn contact_at_target_is_never_recommended() {
        let contacts = vec![contact("c1", "2026-08-01", 1, 7, "2026-08-05")];
        assert!(recommend(&contacts, today(), &config()).is_none());
    }

    #[test]
    fn overdue_beats_cadence_and_stagger() {
        let contacts = vec![
            // Stagger: 1 day since touch
            contact("fresh", "2026-08-01", 1, 1, "2026-08-19"),
            // Cadence: 4 days since touch
            contact("cadence", "2026-08-01", 1, 1, "2026-08-16"),
            // Overdue: 8 days since touch, worst relevance
            contact("late", "2026-08-01", 4, 6, "2026-08-12"),
        ];
        let rec = recommend(&contacts, today(), &config()).unwrap();
        assert_eq!(rec.contact.id, "late");
        assert_eq!(rec.reason, Reason::OverdueFollowup);
    }

    #[test]
    fn cadence_chosen_when_nothing_overdue() {
        let contacts = vec![
            contact("fresh", "2026-08-01", 1, 1, "2026-08-19"),
            contact("cadence", "2026-08-01", 2, 3, "2026-08-16"),
        ];
        let rec = recommend(&contacts, today(), &config()).unwrap();
        assert_eq!(rec.contact.id, "cadence");
        assert_eq!(rec.reason, Reason::BuildCadence);
    }

    #[test]
    fn stagger_when_everything_is_fresh() {
        // 3 touches, last touch 1 day ago: inside the recent window but past
        // the minimum gap.
        let contacts = vec![contact("c1", "2026-08-01", 2, 3, "2026-08-19")];
        let rec = recommend(&contacts, today(), &config()).unwrap();
        assert_eq!(rec.contact.id, "c1");
        assert_eq!(rec.reason, Reason::StaggerRecent);
        assert_eq!(rec.reason.as_str(), "stagger_recent");
    }

    #[test]
    fn touched_today_is_not_a_candidate() {
        let contacts = vec![contact("c1", "2026-08-01", 1, 2, "2026-08-20")];
        assert!(recommend(&contacts, today(), &config()).is_none());
    }

    #[test]
    fn future_dated_touch_clamps_to_today() {
        // Last touch "tomorrow": negative delta clamps to 0, so the contact
        // is treated as touched today and skipped rather than misclassified.
        let contacts = vec![contact("c1", "2026-08-01", 1, 2, "2026-08-21")];
        assert!(recommend(&contacts, today(), &config()).is_none());
    }

    #[test]
    fn overdue_ordered_by_days_then_relevance() {
        let contacts = vec![
            contact("less_late", "2026-08-01", 1, 2, "2026-08-12"), // 8 days
            contact("most_late", "2026-08-01", 4, 2, "2026-08-10"), // 10 days
        ];
        let rec = recommend(&contacts, today(), &config()).unwrap();
        assert_eq!(rec.contact.id, "most_late", "more days overdue wins");

        let contacts = vec![
            contact("low_pri", "2026-08-01", 4, 2, "2026-08-10"),
            contact("high_pri", "2026-08-01", 1, 2, "2026-08-10"),
        ];
        let rec = recommend(&contacts, today(), &config()).unwrap();
        assert_eq!(rec.contact.id, "high_pri", "same days: lower relevance rank wins");
    }

    #[test]
    fn overdue_tie_resolves_to_fewer_touches() {
        let contacts = vec![
            contact("touched_more", "2026-08-01", 2, 5, "2026-08-10"),
            contact("touched_less", "2026-08-01", 2, 2, "2026-08-10"),
        ];
        let rec = recommend(&contacts, today(), &config()).unwrap();
        assert_eq!(rec.contact.id, "touched_less");
    }

    #[test]
    fn full_tie_resolves_by_id() {
        let contacts = vec![
            contact("c2", "2026-08-01", 2, 2, "2026-08-10"),
            contact("c1", "2026-08-01", 2, 2, "2026-08-10"),
        ];
        let rec = recommend(&contacts, today(), &config()).unwrap();
        assert_eq!(rec.contact.id, "c1");
    }

    #[test]
    fn cadence_prefers_lowest_progress_then_relevance_then_age() {
        let contacts = vec![
            contact("behind", "2026-08-05", 3, 1, "2026-08-16"),
            contact("ahead", "2026-08-01", 1, 4, "2026-08-16"),
        ];
        let rec = recommend(&contacts, today(), &config()).unwrap();
        assert_eq!(rec.contact.id, "behind", "fewest touches wins in cadence");

        let contacts = vec![
            contact("low_pri", "2026-08-01", 4, 2, "2026-08-16"),
            contact("high_pri", "2026-08-05", 1, 2, "2026-08-16"),
        ];
        let rec = recommend(&contacts, today(), &config()).unwrap();
        assert_eq!(rec.contact.id, "high_pri");
    }

    #[test]
    fn stagger_prefers_lowest_progress_then_older_touch() {
        let contacts = vec![
            contact("one_day", "2026-08-01", 2, 2, "2026-08-19"), // 1 day
            contact("two_days", "2026-08-01", 2, 2, "2026-08-18"), // 2 days
        ];
        let rec = recommend(&contacts, today(), &config()).unwrap();
        assert_eq!(rec.contact.id, "two_days");
        assert_eq!(rec.reason, Reason::StaggerRecent);
    }

    #[test]
    fn healthy_distribution_still_encourages_new_contact() {
        // All touched today, average touches (4) >= target/2 (3.5).
        let contacts = vec![
            contact("c1", "2026-08-01", 1, 4, "2026-08-20"),
            contact("c2", "2026-08-01", 2, 4, "2026-08-20"),
        ];
        assert!(recommend(&contacts, today(), &config()).is_none());
    }

    #[test]
    fn unhealthy_distribution_also_returns_none() {
        // Same shape but low averages: the fallthrough has no distinct branch.
        let contacts = vec![contact("c1", "2026-08-01", 1, 0, "2026-08-20")];
        assert!(recommend(&contacts, today(), &config()).is_none());
    }

    #[test]
    fn deterministic_on_unchanged_snapshot() {
        let contacts = vec![
            contact("c3", "2026-08-02", 2, 1, "2026-08-11"),
            contact("c1", "2026-08-01", 2, 1, "2026-08-11"),
            contact("c2", "2026-08-01", 2, 1, "2026-08-11"),
        ];
        let first = recommend(&contacts, today(), &config()).unwrap();
        let second = recommend(&contacts, today(), &config()).unwrap();
        assert_eq!(first.contact.id, second.contact.id);
        assert_eq!(first.reason, second.reason);
    }

    #[test]
    fn recommendation_serializes_with_stable_wire_names() {
        let rec = Recommendation {
            contact: contact("c1", "2026-08-01", 2, 3, "2026-08-19"),
            reason: Reason::StaggerRecent,
        };
        let value = serde_json::to_value(&rec).unwrap();
        assert_eq!(value["reason"], "stagger_recent");
        assert_eq!(value["contact"]["touchCount"], 3);
        assert_eq!(value["contact"]["lastTouchDate"], "2026-08-19");
        assert_eq!(
            serde_json::to_value(Reason::OverdueFollowup).unwrap(),
            serde_json::json!("overdue_followup")
        );
    }

    #[test]
    fn config_overrides_change_classification() {
        // 3 days since touch: overdue under a tightened interval.
        let contacts = vec![contact("c1", "2026-08-01", 2, 1, "2026-08-17")];
        let tight = RecommenderConfig {
            followup_interval_days: 3,
            ..RecommenderConfig::default()
        };
        let rec = recommend(&contacts, today(), &tight).unwrap();
        assert_eq!(rec.reason, Reason::OverdueFollowup);
    }

    mod db_facing {
        use super::*;
        use crate::db::contacts::{NewContact, DATE_FMT};
        use crate::db::test_utils::test_db;
        use crate::db::FaithTier;

        #[test]
        fn no_user_means_no_recommendation() {
            let db = test_db();
            let rec = recommend_for(&db, None, today(), &config()).unwrap();
            assert!(rec.is_none());
        }

        #[test]
        fn recommends_from_stored_snapshot() {
            let db = test_db();
            let c = db
                .insert_contact(&NewContact {
                    user_id: "u1".to_string(),
                    name: "Ada".to_string(),
                    initial_date: NaiveDate::parse_from_str("2026-08-10", DATE_FMT).unwrap(),
                    faith: FaithTier::Weak,
                    note: None,
                })
                .unwrap();

            let rec = recommend_for(&db, Some("u1"), today(), &config())
                .unwrap()
                .expect("overdue contact");
            assert_eq!(rec.contact.id, c.id);
            assert_eq!(rec.reason, Reason::OverdueFollowup);

            // Other users see an empty pool.
            assert!(recommend_for(&db, Some("u2"), today(), &config())
                .unwrap()
                .is_none());
        }
    }
}
