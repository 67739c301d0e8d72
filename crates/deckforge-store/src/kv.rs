use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::Result;

impl Database {
    pub fn put_value(&self, key: &str, value: &str) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn delete_value(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }

    /// Keys starting with `prefix` along with their last write time, newest first.
    pub fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<(String, DateTime<Utc>)>> {
        let mut stmt = self.conn().prepare(
            "SELECT key, updated_at FROM kv WHERE substr(key, 1, length(?1)) = ?1
             ORDER BY updated_at DESC",
        )?;
        let rows = stmt.query_map(params![prefix], |row| {
            let key: String = row.get(0)?;
            let ts_str: String = row.get(1)?;
            let updated_at = DateTime::parse_from_rfc3339(&ts_str)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        1,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
            Ok((key, updated_at))
        })?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_delete() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get_value("a").unwrap(), None);

        db.put_value("a", "1").unwrap();
        db.put_value("a", "2").unwrap();
        assert_eq!(db.get_value("a").unwrap().as_deref(), Some("2"));

        assert!(db.delete_value("a").unwrap());
        assert!(!db.delete_value("a").unwrap());
    }

    #[test]
    fn prefix_scan_ignores_like_wildcards() {
        let db = Database::open_in_memory().unwrap();
        db.put_value("deck:1", "x").unwrap();
        db.put_value("deck:2", "y").unwrap();
        db.put_value("deckXother", "z").unwrap();
        db.put_value("active_deck_id", "1").unwrap();

        let keys: Vec<String> = db
            .keys_with_prefix("deck:")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys.len(), 2);
        assert!(keys.iter().all(|k| k.starts_with("deck:")));
    }
}
