use chrono::{NaiveDate, Utc};
use rusqlite::{params, Row};
use uuid::Uuid;

use super::*;

/// Stored date format for `contacts.initial_date` and `touches.date`.
pub const DATE_FMT: &str = "%Y-%m-%d";

/// Fields supplied when creating a contact. Relevance is derived, never given.
#[derive(Debug, Clone)]
pub struct NewContact {
    pub user_id: String,
    pub name: String,
    pub initial_date: NaiveDate,
    pub faith: FaithTier,
    pub note: Option<String>,
}

impl ContactDb {
    /// Insert a new contact. The relevance rank is recomputed from the faith
    /// tier here, as on every write path.
    pub fn insert_contact(&self, new: &NewContact) -> Result<DbContact, DbError> {
        let now = Utc::now().to_rfc3339();
        let contact = DbContact {
            id: format!("ct-{}", Uuid::new_v4()),
            user_id: new.user_id.clone(),
            name: new.name.clone(),
            initial_date: new.initial_date.format(DATE_FMT).to_string(),
            faith: new.faith,
            relevance: new.faith.relevance(),
            completed: false,
            note: new.note.clone(),
            created_at: now.clone(),
            updated_at: now,
        };
        self.conn.execute(
            "INSERT INTO contacts
                (id, user_id, name, initial_date, faith, relevance, completed, note,
                 created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                contact.id,
                contact.user_id,
                contact.name,
                contact.initial_date,
                contact.faith.as_str(),
                contact.relevance,
                contact.completed as i32,
                contact.note,
                contact.created_at,
                contact.updated_at,
            ],
        )?;
        Ok(contact)
    }

    /// Get a contact by ID.
    pub fn get_contact(&self, id: &str) -> Result<Option<DbContact>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, initial_date, faith, relevance, completed, note,
                    created_at, updated_at
             FROM contacts WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], Self::map_contact_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Change a contact's faith tier. Relevance auto-updates in the same
    /// statement so the two can never drift apart.
    pub fn set_faith(&self, id: &str, faith: FaithTier) -> Result<(), DbError> {
        let updated = self.conn.execute(
            "UPDATE contacts SET faith = ?2, relevance = ?3, updated_at = ?4 WHERE id = ?1",
            params![id, faith.as_str(), faith.relevance(), Utc::now().to_rfc3339()],
        )?;
        if updated == 0 {
            return Err(DbError::ContactNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Set or clear a contact's completion flag.
    pub fn set_completed(&self, id: &str, completed: bool) -> Result<(), DbError> {
        let updated = self.conn.execute(
            "UPDATE contacts SET completed = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, completed as i32, Utc::now().to_rfc3339()],
        )?;
        if updated == 0 {
            return Err(DbError::ContactNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Delete a contact. Touches go with it via the FK cascade.
    pub fn delete_contact(&self, id: &str) -> Result<(), DbError> {
        self.conn
            .execute("DELETE FROM contacts WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// All of a user's contacts, oldest initial date first.
    pub fn list_contacts(&self, user_id: &str) -> Result<Vec<DbContact>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, initial_date, faith, relevance, completed, note,
                    created_at, updated_at
             FROM contacts WHERE user_id = ?1 ORDER BY initial_date, id",
        )?;
        let rows = stmt.query_map(params![user_id], Self::map_contact_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Count a user's contacts.
    pub fn count_contacts(&self, user_id: &str) -> Result<i64, DbError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM contacts WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?)
    }

    /// The recommender's snapshot: every non-completed contact for the user
    /// with its touch count and last touch date, aggregated in one grouped
    /// query instead of N+1 per-contact lookups. Rows whose stored dates fail
    /// to parse are skipped with a warning rather than failing the whole
    /// snapshot.
    pub fn list_active_contacts(&self, user_id: &str) -> Result<Vec<ActiveContact>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.name, c.initial_date, c.relevance,
                    COUNT(t.id) AS touch_count,
                    COALESCE(MAX(t.date), c.initial_date) AS last_touch_date
             FROM contacts c
             LEFT JOIN touches t ON t.contact_id = c.id
             WHERE c.user_id = ?1 AND c.completed = 0
             GROUP BY c.id
             ORDER BY c.initial_date, c.id",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut contacts = Vec::new();
        for row in rows {
            let (id, name, initial_date, relevance, touch_count, last_touch_date) = row?;
            let initial = match NaiveDate::parse_from_str(&initial_date, DATE_FMT) {
                Ok(d) => d,
                Err(e) => {
                    log::warn!("Skipping contact {} with bad initial_date {:?}: {}", id, initial_date, e);
                    continue;
                }
            };
            let last_touch = match NaiveDate::parse_from_str(&last_touch_date, DATE_FMT) {
                Ok(d) => d,
                Err(e) => {
                    log::warn!("Skipping contact {} with bad touch date {:?}: {}", id, last_touch_date, e);
                    continue;
                }
            };
            contacts.push(ActiveContact {
                id,
                name,
                initial_date: initial,
                relevance,
                touch_count,
                last_touch_date: last_touch,
            });
        }
        Ok(contacts)
    }

    fn map_contact_row(row: &Row) -> rusqlite::Result<DbContact> {
        Ok(DbContact {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            initial_date: row.get(3)?,
            faith: FaithTier::parse(&row.get::<_, String>(4)?),
            relevance: row.get(5)?,
            completed: row.get::<_, i32>(6)? != 0,
            note: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
