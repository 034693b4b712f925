use anyhow::{Context, Result};

use super::schema::Database;
use super::types::{CategoryFilter, Quote};

/// Slot holding the JSON-serialized quote list.
pub const QUOTES_SLOT: &str = "quotes";
/// Slot holding the selected category string.
const SELECTED_CATEGORY_SLOT: &str = "selected_category";

impl Database {
    // ========================================================================
    // Quote List Persistence
    // ========================================================================

    /// Load the persisted quote list.
    ///
    /// Returns `Ok(None)` when nothing has been saved yet, and an error when
    /// the stored JSON cannot be decoded.
    pub async fn load_quotes(&self) -> Result<Option<Vec<Quote>>> {
        let Some(raw) = self.get_slot(QUOTES_SLOT).await? else {
            return Ok(None);
        };
        let quotes: Vec<Quote> =
            serde_json::from_str(&raw).context("Persisted quote list is not valid JSON")?;
        Ok(Some(quotes))
    }

    /// Replace the persisted quote list. Order and fields are kept as-is.
    pub async fn save_quotes(&self, quotes: &[Quote]) -> Result<()> {
        let json = serde_json::to_string(quotes)?;
        self.set_slot(QUOTES_SLOT, &json).await?;
        tracing::trace!(count = quotes.len(), "Saved quote list");
        Ok(())
    }

    /// Load the persisted category selection, defaulting to `All`.
    pub async fn load_selected_category(&self) -> Result<CategoryFilter> {
        Ok(self
            .get_slot(SELECTED_CATEGORY_SLOT)
            .await?
            .map(|value| CategoryFilter::parse(&value))
            .unwrap_or_default())
    }

    pub async fn save_selected_category(&self, filter: &CategoryFilter) -> Result<()> {
        self.set_slot(SELECTED_CATEGORY_SLOT, filter.as_str()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_load_quotes_empty_store() {
        let db = test_db().await;
        assert!(db.load_quotes().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_round_trip_preserves_order_and_fields() {
        let db = test_db().await;
        let quotes = vec![
            Quote::with_id(7, "Second thoughts", "Life"),
            Quote::new("First light", "Motivation"),
            Quote::with_id(2, "Nested \"quotes\" and ünïcode", "Misc"),
        ];
        db.save_quotes(&quotes).await.unwrap();

        let loaded = db.load_quotes().await.unwrap().unwrap();
        assert_eq!(loaded, quotes);
    }

    #[tokio::test]
    async fn test_load_quotes_corrupt_json() {
        let db = test_db().await;
        db.set_slot(QUOTES_SLOT, "{not json").await.unwrap();
        assert!(db.load_quotes().await.is_err());
    }

    #[tokio::test]
    async fn test_selected_category_default_all() {
        let db = test_db().await;
        assert_eq!(
            db.load_selected_category().await.unwrap(),
            CategoryFilter::All
        );
    }

    #[tokio::test]
    async fn test_selected_category_round_trip() {
        let db = test_db().await;
        let filter = CategoryFilter::Category("Success".into());
        db.save_selected_category(&filter).await.unwrap();
        assert_eq!(db.load_selected_category().await.unwrap(), filter);
    }
}
