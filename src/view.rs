//! Pure filter and presentation helpers.
//!
//! Nothing here touches storage or the network; the store calls into these
//! and the CLI prints what they return.
use rand::Rng;

use crate::storage::{CategoryFilter, Quote};
use crate::util::{strip_control_chars, truncate_to_width};

/// Shown when the active filter matches nothing.
pub const EMPTY_PLACEHOLDER: &str = "No quotes available in this category.";

/// Distinct categories in first-seen order, preceded by `"all"`.
///
/// A quote filed under the literal `"all"` is only reachable through the
/// unfiltered view, so it adds no entry of its own.
pub fn categories(quotes: &[Quote]) -> Vec<String> {
    let mut out = vec![CategoryFilter::ALL.to_string()];
    for quote in quotes {
        if !out.iter().any(|c| *c == quote.category) {
            out.push(quote.category.clone());
        }
    }
    out
}

/// Quotes eligible under `filter`, in list order.
pub fn filter_quotes<'a>(quotes: &'a [Quote], filter: &CategoryFilter) -> Vec<&'a Quote> {
    quotes.iter().filter(|q| filter.matches(q)).collect()
}

/// Uniformly pick one eligible quote, returning its index in `quotes`.
pub fn pick_random<R: Rng + ?Sized>(
    quotes: &[Quote],
    filter: &CategoryFilter,
    rng: &mut R,
) -> Option<usize> {
    let eligible: Vec<usize> = quotes
        .iter()
        .enumerate()
        .filter(|(_, q)| filter.matches(q))
        .map(|(idx, _)| idx)
        .collect();

    if eligible.is_empty() {
        return None;
    }
    Some(eligible[rng.gen_range(0..eligible.len())])
}

/// A persisted selection only survives if the category still exists.
pub fn resolve_selection(categories: &[String], filter: &CategoryFilter) -> CategoryFilter {
    match filter {
        CategoryFilter::Category(name) if !categories.iter().any(|c| c == name) => {
            tracing::debug!(category = %name, "Selected category no longer present, showing all");
            CategoryFilter::All
        }
        other => other.clone(),
    }
}

/// Two-line display form of a quote, each line fitted to `width` columns.
pub fn render_quote(quote: &Quote, width: usize) -> String {
    let text = format!("\"{}\"", strip_control_chars(&quote.text));
    let category = format!("Category: {}", strip_control_chars(&quote.category));
    format!(
        "{}\n{}",
        truncate_to_width(&text, width),
        truncate_to_width(&category, width)
    )
}

/// Display form for an optional pick: the quote, or the placeholder.
pub fn render_selection(quote: Option<&Quote>, width: usize) -> String {
    match quote {
        Some(q) => render_quote(q, width),
        None => EMPTY_PLACEHOLDER.to_string(),
    }
}
