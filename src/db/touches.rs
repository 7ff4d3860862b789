use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Row};
use uuid::Uuid;

use super::contacts::DATE_FMT;
use super::*;

impl ContactDb {
    /// Record a follow-up visit for a contact. When the contact's touch count
    /// reaches `followup_target` the contact is marked completed in the same
    /// transaction, so readers never observe the count past the target with
    /// the flag still clear.
    ///
    /// A date before the contact's initial date is tolerated — storage does
    /// not enforce that invariant, the recommender degrades gracefully.
    pub fn add_touch(
        &self,
        contact_id: &str,
        date: NaiveDate,
        note: Option<&str>,
        followup_target: i64,
    ) -> Result<DbTouch, DbError> {
        if self.get_contact(contact_id)?.is_none() {
            return Err(DbError::ContactNotFound(contact_id.to_string()));
        }

        let touch = DbTouch {
            id: format!("fu-{}", Uuid::new_v4()),
            contact_id: contact_id.to_string(),
            date: date.format(DATE_FMT).to_string(),
            note: note.map(ToString::to_string),
            created_at: Utc::now().to_rfc3339(),
        };

        self.with_transaction(|db| {
            db.conn_ref().execute(
                "INSERT INTO touches (id, contact_id, date, note, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![touch.id, touch.contact_id, touch.date, touch.note, touch.created_at],
            )?;

            let count: i64 = db.conn_ref().query_row(
                "SELECT COUNT(*) FROM touches WHERE contact_id = ?1",
                params![contact_id],
                |row| row.get(0),
            )?;
            if count >= followup_target {
                db.conn_ref().execute(
                    "UPDATE contacts SET completed = 1, updated_at = ?2 WHERE id = ?1",
                    params![contact_id, Utc::now().to_rfc3339()],
                )?;
                log::info!(
                    "Contact {} reached {} touches, marked completed",
                    contact_id,
                    count
                );
            }
            Ok(())
        })?;

        Ok(touch)
    }

    /// All touches for a contact, oldest first.
    pub fn list_touches(&self, contact_id: &str) -> Result<Vec<DbTouch>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, contact_id, date, note, created_at
             FROM touches WHERE contact_id = ?1 ORDER BY date, id",
        )?;
        let rows = stmt.query_map(params![contact_id], Self::map_touch_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Number of touches recorded for a contact.
    pub fn touch_count(&self, contact_id: &str) -> Result<i64, DbError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM touches WHERE contact_id = ?1",
            params![contact_id],
            |row| row.get(0),
        )?)
    }

    /// Total touches recorded for a user across all contacts.
    pub fn count_touches(&self, user_id: &str) -> Result<i64, DbError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM touches t
             JOIN contacts c ON c.id = t.contact_id
             WHERE c.user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?)
    }

    /// Distinct touch dates for a user within `[start, end]`, as stored
    /// strings. One query feeds a whole calendar month.
    pub fn touch_dates_in_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashSet<String>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT t.date FROM touches t
             JOIN contacts c ON c.id = t.contact_id
             WHERE c.user_id = ?1 AND t.date >= ?2 AND t.date <= ?3",
        )?;
        let rows = stmt.query_map(
            params![
                user_id,
                start.format(DATE_FMT).to_string(),
                end.format(DATE_FMT).to_string()
            ],
            |row| row.get::<_, String>(0),
        )?;
        Ok(rows.collect::<Result<HashSet<_>, _>>()?)
    }

    fn map_touch_row(row: &Row) -> rusqlite::Result<DbTouch> {
        Ok(DbTouch {
            id: row.get(0)?,
            contact_id: row.get(1)?,
            date: row.get(2)?,
            note: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
