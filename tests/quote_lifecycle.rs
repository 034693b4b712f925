//! Integration tests for the quote lifecycle: load, add, filter, reload.
//!
//! Each test opens its own SQLite store. File-backed tests use a unique path
//! under the system temp dir so reloads go through a real reopen.

use pretty_assertions::assert_eq;
use quoteshelf::storage::{CategoryFilter, Database, Quote};
use quoteshelf::store::{default_quotes, QuoteError, QuoteStore};
use quoteshelf::view;

fn temp_db_path(name: &str) -> String {
    let dir = std::env::temp_dir().join("quoteshelf_lifecycle_tests");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{}_{}.db", name, std::process::id()));
    let _ = std::fs::remove_file(&path);
    path.to_str().unwrap().to_string()
}

// ============================================================================
// Persistence Across Reopen
// ============================================================================

#[tokio::test]
async fn test_added_quote_survives_reopen() {
    let path = temp_db_path("survives_reopen");

    {
        let db = Database::open(&path).await.unwrap();
        let mut store = QuoteStore::load(db).await.unwrap();
        store.add("Simplicity is prerequisite for reliability.", "Engineering")
            .await
            .unwrap();
        store
            .set_filter(CategoryFilter::Category("Engineering".into()))
            .await
            .unwrap();
    }

    let db = Database::open(&path).await.unwrap();
    let mut store = QuoteStore::load(db).await.unwrap();
    assert_eq!(store.len(), default_quotes().len() + 1);
    assert_eq!(
        store.filter(),
        &CategoryFilter::Category("Engineering".into())
    );

    let shown = store.random_quote().unwrap();
    assert_eq!(shown.text, "Simplicity is prerequisite for reliability.");

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_save_then_reload_is_identical() {
    let path = temp_db_path("identical_reload");

    let original = {
        let db = Database::open(&path).await.unwrap();
        let mut store = QuoteStore::load(db).await.unwrap();
        store.add("One", "A").await.unwrap();
        store
            .apply_remote(&[Quote::with_id(42, "Two", "B")])
            .await
            .unwrap();
        store.save().await.unwrap();
        store.quotes().to_vec()
    };

    let db = Database::open(&path).await.unwrap();
    let reloaded = QuoteStore::load(db).await.unwrap();
    assert_eq!(reloaded.quotes(), original.as_slice());

    let _ = std::fs::remove_file(&path);
}

// ============================================================================
// Add / Filter Interplay
// ============================================================================

#[tokio::test]
async fn test_rejected_add_changes_nothing() {
    let db = Database::open(":memory:").await.unwrap();
    let mut store = QuoteStore::load(db).await.unwrap();
    let (categories_before, _) = store.populate_categories().await.unwrap();

    let err = store.add("\x1b[0m  ", "Life").await.unwrap_err();
    assert!(matches!(err, QuoteError::EmptyField("text")));

    let (categories_after, _) = store.populate_categories().await.unwrap();
    assert_eq!(categories_before, categories_after);
    assert_eq!(store.len(), default_quotes().len());
}

#[tokio::test]
async fn test_new_category_becomes_selectable() {
    let db = Database::open(":memory:").await.unwrap();
    let mut store = QuoteStore::load(db).await.unwrap();
    store.add("Knock knock.", "Humor").await.unwrap();

    let (categories, _) = store.populate_categories().await.unwrap();
    assert!(categories.contains(&"Humor".to_string()));

    let humor = store
        .set_filter(CategoryFilter::parse("Humor"))
        .await
        .unwrap();
    assert_eq!(humor.len(), 1);
    assert_eq!(humor[0].text, "Knock knock.");

    let all = store.set_filter(CategoryFilter::parse("all")).await.unwrap();
    assert_eq!(all.len(), default_quotes().len() + 1);
}

#[tokio::test]
async fn test_empty_filter_renders_placeholder() {
    let db = Database::open(":memory:").await.unwrap();
    let mut store = QuoteStore::load(db).await.unwrap();
    store
        .set_filter(CategoryFilter::Category("Poetry".into()))
        .await
        .unwrap();

    let rendered = view::render_selection(store.random_quote(), 80);
    assert_eq!(rendered, view::EMPTY_PLACEHOLDER);
}
