//! Synthetic data seeding for development.
//!
//! Idempotent: without `clear`, seeding only tops up the user's contacts
//! until the target count is reached, so repeated runs don't multiply data.
//! Generated touch chains never pass today — future-dated touches are
//! skipped, matching what the recommender expects from real data.

use chrono::{Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::db::contacts::NewContact;
use crate::db::{ContactDb, DbError, FaithTier};

const FIRST_NAMES: &[&str] = &[
    "Ada", "Ben", "Chloe", "Daniel", "Esther", "Felix", "Grace", "Hannah", "Isaac", "Joy",
    "Kwame", "Lydia", "Moses", "Naomi", "Obed", "Priscilla", "Ruth", "Samuel", "Tabitha", "Uche",
];

const LAST_NAMES: &[&str] = &[
    "Adeyemi", "Brown", "Carter", "Danjuma", "Eze", "Fashola", "Garba", "Hassan", "Ibrahim",
    "Johnson", "Koffi", "Lawal", "Mensah", "Nwosu", "Okafor", "Peters", "Quartey", "Sule",
    "Taylor", "Umar",
];

const FAITH_TIERS: &[FaithTier] = &[
    FaithTier::Strong,
    FaithTier::Weak,
    FaithTier::Unbeliever,
    FaithTier::Unknown,
];

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Invalid touch range: min {min} > max {max}")]
    InvalidTouchRange { min: i64, max: i64 },
}

#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub user_id: String,
    /// Desired contact count for the user after seeding.
    pub target_contacts: i64,
    pub touches_min: i64,
    pub touches_max: i64,
    /// Initial contact dates fall within this many past days.
    pub past_days: i64,
    /// Wipe the user's existing contacts (and their touches) first.
    pub clear: bool,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            user_id: "evangelist".to_string(),
            target_contacts: 25,
            touches_min: 0,
            touches_max: 5,
            past_days: 90,
            clear: false,
        }
    }
}

impl SeedOptions {
    /// Read overrides from the environment, falling back to defaults on
    /// missing or unparseable values.
    pub fn from_env(user_id: &str) -> Self {
        let defaults = Self::default();
        Self {
            user_id: user_id.to_string(),
            target_contacts: env_i64("SEED_CONTACTS", defaults.target_contacts),
            touches_min: env_i64("SEED_TOUCHES_MIN", defaults.touches_min),
            touches_max: env_i64("SEED_TOUCHES_MAX", defaults.touches_max),
            past_days: env_i64("SEED_PAST_DAYS", defaults.past_days),
            clear: std::env::var("SEED_CLEAR")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

fn env_i64(name: &str, default: i64) -> i64 {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("Ignoring unparseable {}={:?}", name, raw);
            default
        }),
        Err(_) => default,
    }
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub created_contacts: i64,
    pub created_touches: i64,
    pub cleared: bool,
}

/// Seed contacts and touches for a user up to the configured target.
/// `followup_target` is threaded through so seeded touch counts trip the
/// same auto-completion as real ones.
pub fn seed(
    db: &ContactDb,
    options: &SeedOptions,
    today: NaiveDate,
    followup_target: i64,
) -> Result<SeedSummary, SeedError> {
    if options.touches_min > options.touches_max {
        return Err(SeedError::InvalidTouchRange {
            min: options.touches_min,
            max: options.touches_max,
        });
    }

    if options.clear {
        log::info!("Clearing existing contacts for {}", options.user_id);
        for contact in db.list_contacts(&options.user_id)? {
            db.delete_contact(&contact.id)?;
        }
    }

    let existing = db.count_contacts(&options.user_id)?;
    let to_create = (options.target_contacts - existing).max(0);
    if to_create == 0 {
        log::info!(
            "{} already has {} contacts (target {}), nothing to seed",
            options.user_id,
            existing,
            options.target_contacts
        );
    }

    let mut rng = rand::thread_rng();
    let mut created_touches = 0i64;

    for n in 0..to_create {
        let first = FIRST_NAMES.choose(&mut rng).unwrap_or(&"Ada");
        let last = LAST_NAMES.choose(&mut rng).unwrap_or(&"Okafor");
        let initial_date = today - Duration::days(rng.gen_range(0..=options.past_days));
        let faith = *FAITH_TIERS.choose(&mut rng).unwrap_or(&FaithTier::Unknown);

        let contact = db.insert_contact(&NewContact {
            user_id: options.user_id.clone(),
            // Counter suffix keeps names unique within a run.
            name: format!("{} {} {}", first, last, existing + n + 1),
            initial_date,
            faith,
            note: None,
        })?;

        let planned = rng.gen_range(options.touches_min..=options.touches_max);
        let mut cursor = initial_date;
        for _ in 0..planned {
            cursor += Duration::days(rng.gen_range(1..=10));
            if cursor > today {
                // Never generate future-dated touches.
                break;
            }
            db.add_touch(&contact.id, cursor, None, followup_target)?;
            created_touches += 1;
        }
    }

    Ok(SeedSummary {
        created_contacts: to_create,
        created_touches,
        cleared: options.clear,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::contacts::DATE_FMT;
    use crate::db::test_utils::test_db;

    fn today() -> NaiveDate {
        NaiveDate::parse_from_str("2026-08-20", DATE_FMT).unwrap()
    }

    fn options(target: i64) -> SeedOptions {
        SeedOptions {
            user_id: "u1".to_string(),
            target_contacts: target,
            touches_min: 1,
            touches_max: 3,
            past_days: 30,
            clear: false,
        }
    }

    #[test]
    fn seeds_up_to_target_and_is_idempotent() {
        let db = test_db();
        let summary = seed(&db, &options(5), today(), 7).unwrap();
        assert_eq!(summary.created_contacts, 5);
        assert_eq!(db.count_contacts("u1").unwrap(), 5);

        let again = seed(&db, &options(5), today(), 7).unwrap();
        assert_eq!(again.created_contacts, 0);
        assert_eq!(db.count_contacts("u1").unwrap(), 5);
    }

    #[test]
    fn clear_replaces_existing_data() {
        let db = test_db();
        seed(&db, &options(3), today(), 7).unwrap();
        let mut opts = options(2);
        opts.clear = true;
        let summary = seed(&db, &opts, today(), 7).unwrap();
        assert!(summary.cleared);
        assert_eq!(db.count_contacts("u1").unwrap(), 2);
    }

    #[test]
    fn never_seeds_future_touches() {
        let db = test_db();
        let mut opts = options(10);
        opts.touches_max = 8;
        seed(&db, &opts, today(), 100).unwrap();

        for contact in db.list_contacts("u1").unwrap() {
            for touch in db.list_touches(&contact.id).unwrap() {
                let date = NaiveDate::parse_from_str(&touch.date, DATE_FMT).unwrap();
                assert!(date <= today(), "seeded touch {} is in the future", touch.date);
            }
        }
    }

    #[test]
    fn rejects_inverted_touch_range() {
        let db = test_db();
        let mut opts = options(1);
        opts.touches_min = 4;
        opts.touches_max = 2;
        assert!(matches!(
            seed(&db, &opts, today(), 7),
            Err(SeedError::InvalidTouchRange { .. })
        ));
    }
}
