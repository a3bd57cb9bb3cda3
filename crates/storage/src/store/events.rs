#![forbid(unsafe_code)]

use super::support::event_exists_tx;
use super::*;
use inv_core::VariantKey;
use rusqlite::{OptionalExtension, params};

impl SqliteStore {
    pub fn create_event(&mut self, name: &str, event_date: Option<&str>) -> Result<Event, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidArgument("event name must not be empty"));
        }
        let event_date = event_date.map(str::trim).filter(|date| !date.is_empty());
        let created_at_ms = now_ms();
        self.conn.execute(
            "INSERT INTO events(name, event_date, created_at_ms) VALUES (?1, ?2, ?3)",
            params![name, event_date, created_at_ms],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::info!(event_id = id, name, "event created");
        Ok(Event {
            id,
            name: name.to_string(),
            event_date: event_date.map(str::to_string),
            created_at_ms,
        })
    }

    pub fn get_event(&self, id: i64) -> Result<Option<Event>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, event_date, created_at_ms FROM events WHERE id=?1",
                params![id],
                |row| {
                    Ok(Event {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        event_date: row.get(2)?,
                        created_at_ms: row.get(3)?,
                    })
                },
            )
            .optional()?)
    }

    /// Sets the desired quantity for `key` at `event_id`. Zero removes the
    /// target.
    pub fn set_event_target(
        &mut self,
        event_id: i64,
        key: &VariantKey,
        quantity: i64,
    ) -> Result<(), StoreError> {
        if quantity < 0 {
            return Err(StoreError::InvalidArgument("target quantity must be >= 0"));
        }
        let tx = self.conn.transaction()?;
        if !event_exists_tx(&tx, event_id)? {
            return Err(StoreError::NotFound("event"));
        }
        if quantity == 0 {
            tx.execute(
                "DELETE FROM event_targets WHERE event_id=?1 AND category=?2 \
                 AND product_folder=?3 AND color=?4 AND size=?5",
                params![event_id, key.category(), key.folder(), key.color(), key.size()],
            )?;
        } else {
            tx.execute(
                "INSERT INTO event_targets(event_id, category, product_folder, color, size, quantity) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
                 ON CONFLICT(event_id, category, product_folder, color, size) DO UPDATE SET \
                   quantity=excluded.quantity",
                params![
                    event_id,
                    key.category(),
                    key.folder(),
                    key.color(),
                    key.size(),
                    quantity
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn list_event_targets(&self, event_id: i64) -> Result<Vec<EventTarget>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT category, product_folder, color, size, quantity FROM event_targets \
             WHERE event_id=?1 ORDER BY category, product_folder, color, size",
        )?;
        let mut rows = stmt.query(params![event_id])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let category: String = row.get(0)?;
            let folder: String = row.get(1)?;
            let color: String = row.get(2)?;
            let size: String = row.get(3)?;
            out.push(EventTarget {
                event_id,
                key: VariantKey::try_new(&category, &folder, &color, &size)?,
                quantity: row.get(4)?,
            });
        }
        Ok(out)
    }

    /// Every target of the event against current stock.
    pub fn event_deficits(&self, event_id: i64) -> Result<Vec<EventDeficit>, StoreError> {
        if self.get_event(event_id)?.is_none() {
            return Err(StoreError::NotFound("event"));
        }
        let mut stmt = self.conn.prepare(
            "SELECT t.category, t.product_folder, t.color, t.size, t.quantity, \
                    COALESCE(s.quantity, 0) \
             FROM event_targets t \
             LEFT JOIN stock s ON s.category=t.category AND s.product_folder=t.product_folder \
               AND s.color=t.color AND s.size=t.size \
             WHERE t.event_id=?1 \
             ORDER BY t.category, t.product_folder, t.color, t.size",
        )?;
        let mut rows = stmt.query(params![event_id])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let category: String = row.get(0)?;
            let folder: String = row.get(1)?;
            let color: String = row.get(2)?;
            let size: String = row.get(3)?;
            let target: i64 = row.get(4)?;
            let on_hand: i64 = row.get(5)?;
            out.push(EventDeficit {
                key: VariantKey::try_new(&category, &folder, &color, &size)?,
                target,
                on_hand,
                deficit: (target - on_hand).max(0),
            });
        }
        Ok(out)
    }
}
