use anyhow::Result;

use super::schema::Database;

impl Database {
    // ========================================================================
    // Slot Operations
    // ========================================================================

    /// Read a slot value by key, or `None` if it was never written.
    pub async fn get_slot(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Write a slot value (UPSERT).
    pub async fn set_slot(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::Database;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_get_slot_missing() {
        let db = test_db().await;
        assert_eq!(db.get_slot("nonexistent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_and_get_slot() {
        let db = test_db().await;
        db.set_slot("selected_category", "Life").await.unwrap();
        assert_eq!(
            db.get_slot("selected_category").await.unwrap(),
            Some("Life".to_string())
        );
    }

    #[tokio::test]
    async fn test_set_slot_upsert() {
        let db = test_db().await;
        db.set_slot("selected_category", "Life").await.unwrap();
        db.set_slot("selected_category", "all").await.unwrap();
        assert_eq!(
            db.get_slot("selected_category").await.unwrap(),
            Some("all".to_string())
        );
    }
}
