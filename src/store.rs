//! The owned quote list and its persisted selection.
//!
//! `QuoteStore` is the single mutable owner of the list. Every mutation goes
//! through it and is written back to the [`Database`] before returning.
use rand::Rng;
use thiserror::Error;

use crate::storage::{CategoryFilter, Database, Quote};
use crate::sync::{merge, MergeReport};
use crate::util::sanitize_field;
use crate::view;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum QuoteError {
    /// A required field was blank. The list is left unchanged.
    #[error("Please enter both quote text and category (missing {0})")]
    EmptyField(&'static str),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("Invalid quote JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Built-in quotes used until something has been persisted.
pub fn default_quotes() -> Vec<Quote> {
    vec![
        Quote::new(
            "The future belongs to those who believe in their dreams.",
            "Motivation",
        ),
        Quote::new(
            "Life is what happens when you're busy making other plans.",
            "Life",
        ),
        Quote::new(
            "Success is not final, failure is not fatal: it is the courage to continue that counts.",
            "Success",
        ),
        Quote::new("Happiness depends upon ourselves.", "Happiness"),
    ]
}

// ============================================================================
// QuoteStore
// ============================================================================

pub struct QuoteStore {
    db: Database,
    quotes: Vec<Quote>,
    filter: CategoryFilter,
    /// Index of the last quote shown. Lives only as long as the process.
    last_viewed: Option<usize>,
}

impl QuoteStore {
    /// Load the persisted list and selection, falling back to the defaults.
    ///
    /// A persisted list that no longer decodes is logged and replaced by the
    /// defaults on the next save; persisted entries with blank fields are
    /// dropped. Storage failures are returned, never papered over, so a
    /// transient error cannot lead to the real list being overwritten.
    pub async fn load(db: Database) -> Result<Self, QuoteError> {
        let quotes = match db.load_quotes().await {
            Ok(Some(quotes)) => {
                let total = quotes.len();
                let valid: Vec<Quote> = quotes.into_iter().filter(Quote::is_valid).collect();
                if valid.len() < total {
                    tracing::warn!(dropped = total - valid.len(), "Dropped persisted quotes with blank fields");
                }
                valid
            }
            Ok(None) => {
                tracing::debug!("No persisted quotes, using defaults");
                default_quotes()
            }
            Err(e) if e.is::<serde_json::Error>() => {
                tracing::warn!(error = %e, "Persisted quotes unreadable, using defaults");
                default_quotes()
            }
            Err(e) => return Err(QuoteError::Storage(e)),
        };
        let filter = db.load_selected_category().await?;

        tracing::debug!(count = quotes.len(), filter = %filter, "Quote store loaded");
        Ok(Self {
            db,
            quotes,
            filter,
            last_viewed: None,
        })
    }

    /// Write the list and the selection back to storage.
    pub async fn save(&self) -> Result<(), QuoteError> {
        self.db.save_quotes(&self.quotes).await?;
        self.db.save_selected_category(&self.filter).await?;
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Validate and append a quote, then persist.
    ///
    /// Both fields are sanitized and trimmed first; either being blank yields
    /// [`QuoteError::EmptyField`] with no state change. If persisting fails
    /// the append is rolled back.
    pub async fn add(&mut self, text: &str, category: &str) -> Result<Quote, QuoteError> {
        let text = sanitize_field(text);
        let category = sanitize_field(category);
        if text.is_empty() {
            return Err(QuoteError::EmptyField("text"));
        }
        if category.is_empty() {
            return Err(QuoteError::EmptyField("category"));
        }

        let quote = Quote::new(text, category);
        self.quotes.push(quote.clone());
        if let Err(e) = self.db.save_quotes(&self.quotes).await {
            self.quotes.pop();
            return Err(e.into());
        }

        tracing::info!(category = %quote.category, total = self.quotes.len(), "Quote added");
        Ok(quote)
    }

    /// Fold a fetched remote collection into the list and persist if changed.
    pub async fn apply_remote(&mut self, remote: &[Quote]) -> Result<MergeReport, QuoteError> {
        let outcome = merge(&self.quotes, remote);
        if outcome.report.changed() {
            self.db.save_quotes(&outcome.quotes).await?;
            self.quotes = outcome.quotes;
            if self
                .last_viewed
                .is_some_and(|idx| idx >= self.quotes.len())
            {
                self.last_viewed = None;
            }
        }
        Ok(outcome.report)
    }

    /// Append every valid quote from a JSON array and persist.
    ///
    /// Entries that are not quote objects, or whose fields are missing or
    /// blank, are skipped. Only a document that is not a JSON array is an
    /// error. Returns how many were added.
    pub async fn import_json(&mut self, json: &str) -> Result<usize, QuoteError> {
        let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let total = entries.len();
        let valid: Vec<Quote> = entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value::<Quote>(entry).ok())
            .map(|q| Quote {
                id: q.id,
                text: sanitize_field(&q.text),
                category: sanitize_field(&q.category),
            })
            .filter(Quote::is_valid)
            .collect();

        if valid.len() < total {
            tracing::warn!(skipped = total - valid.len(), "Skipped invalid imported entries");
        }
        let imported = valid.len();
        if imported > 0 {
            let previous_len = self.quotes.len();
            self.quotes.extend(valid);
            if let Err(e) = self.db.save_quotes(&self.quotes).await {
                self.quotes.truncate(previous_len);
                return Err(e.into());
            }
        }

        tracing::info!(imported, total = self.quotes.len(), "Quotes imported");
        Ok(imported)
    }

    /// Pretty JSON of the whole list, suitable for [`import_json`](Self::import_json).
    pub fn export_json(&self) -> Result<String, QuoteError> {
        Ok(serde_json::to_string_pretty(&self.quotes)?)
    }

    // ========================================================================
    // Filter and View
    // ========================================================================

    /// Category options plus the selection to show.
    ///
    /// A persisted selection whose category has disappeared resets to `all`,
    /// and the reset is written back.
    pub async fn populate_categories(
        &mut self,
    ) -> Result<(Vec<String>, CategoryFilter), QuoteError> {
        let categories = view::categories(&self.quotes);
        let resolved = view::resolve_selection(&categories, &self.filter);
        if resolved != self.filter {
            self.db.save_selected_category(&resolved).await?;
            tracing::debug!(stale = %self.filter, "Selected category is gone, reset to all");
            self.filter = resolved;
            self.last_viewed = None;
        }
        Ok((categories, self.filter.clone()))
    }

    /// Change and persist the selection; returns the newly filtered view.
    pub async fn set_filter(&mut self, filter: CategoryFilter) -> Result<Vec<&Quote>, QuoteError> {
        self.db.save_selected_category(&filter).await?;
        tracing::debug!(filter = %filter, "Category filter changed");
        self.filter = filter;
        self.last_viewed = None;
        Ok(self.filtered())
    }

    pub fn filtered(&self) -> Vec<&Quote> {
        view::filter_quotes(&self.quotes, &self.filter)
    }

    /// Pick a random quote under the active filter.
    pub fn random_quote(&mut self) -> Option<&Quote> {
        self.random_quote_with(&mut rand::thread_rng())
    }

    pub fn random_quote_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<&Quote> {
        let idx = view::pick_random(&self.quotes, &self.filter, rng)?;
        self.last_viewed = Some(idx);
        self.quotes.get(idx)
    }

    /// The quote shown by the most recent [`random_quote`](Self::random_quote).
    pub fn last_viewed(&self) -> Option<&Quote> {
        self.last_viewed.and_then(|idx| self.quotes.get(idx))
    }
}
