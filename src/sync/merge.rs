use crate::storage::Quote;

/// Counts describing what a merge changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Local records overwritten by a differing remote record.
    pub conflicts: usize,
    /// Remote records with no local counterpart, appended.
    pub added: usize,
    /// Local records that only gained the remote id (same text and category).
    pub linked: usize,
    /// Remote records identical to their local counterpart.
    pub unchanged: usize,
}

impl MergeReport {
    pub fn has_conflicts(&self) -> bool {
        self.conflicts > 0
    }

    /// Whether the merged list differs from the local one.
    pub fn changed(&self) -> bool {
        self.conflicts > 0 || self.added > 0 || self.linked > 0
    }
}

/// Merged list plus the report describing how it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub quotes: Vec<Quote>,
    pub report: MergeReport,
}

/// Fold `remote` into `local`. Remote is authoritative.
///
/// For each remote record, in order:
/// 1. a local record with the same `id` is overwritten in place;
/// 2. failing that, a local record with identical text is overwritten,
///    provided at most one side carries an id (a locally added quote coming
///    back from the server, or an id-less remote item);
/// 3. otherwise the record is appended.
///
/// Local-only records are kept where they are. An overwrite only counts as a
/// conflict when text or category actually differ; gaining an id alone is a
/// link.
///
/// Remote records are only ever matched against local ones, never against
/// each other. A batch that repeats an id is collapsed first, the last copy
/// winning, so each report count refers to one distinct remote record.
pub fn merge(local: &[Quote], remote: &[Quote]) -> MergeOutcome {
    let remote = dedup_by_id(remote);
    let mut quotes = local.to_vec();
    let mut report = MergeReport::default();

    for incoming in &remote {
        let existing = &quotes[..local.len()];
        let by_id = incoming
            .id
            .and_then(|id| existing.iter().position(|q| q.id == Some(id)));
        let target = by_id.or_else(|| {
            existing.iter().position(|q| {
                q.text == incoming.text && (q.id.is_none() || incoming.id.is_none())
            })
        });

        match target {
            Some(idx) => {
                let merged = merged_record(&quotes[idx], incoming);
                if merged == quotes[idx] {
                    report.unchanged += 1;
                    continue;
                }
                if merged.text == quotes[idx].text && merged.category == quotes[idx].category {
                    report.linked += 1;
                } else {
                    tracing::debug!(
                        id = ?merged.id,
                        local_category = %quotes[idx].category,
                        remote_category = %merged.category,
                        "Remote record overwrites local"
                    );
                    report.conflicts += 1;
                }
                quotes[idx] = merged;
            }
            None => {
                quotes.push(incoming.clone());
                report.added += 1;
            }
        }
    }

    MergeOutcome { quotes, report }
}

/// Collapse records sharing an id, keeping the last copy at the first
/// copy's position.
fn dedup_by_id(remote: &[Quote]) -> Vec<Quote> {
    let mut out: Vec<Quote> = Vec::with_capacity(remote.len());
    for record in remote {
        let seen = record
            .id
            .and_then(|id| out.iter().position(|q| q.id == Some(id)));
        match seen {
            Some(idx) => out[idx] = record.clone(),
            None => out.push(record.clone()),
        }
    }
    if out.len() < remote.len() {
        tracing::debug!(
            duplicates = remote.len() - out.len(),
            "Remote batch repeats ids, keeping the last copy"
        );
    }
    out
}

/// Remote fields win; a local id survives only if the remote has none.
fn merged_record(local: &Quote, remote: &Quote) -> Quote {
    Quote {
        id: remote.id.or(local.id),
        text: remote.text.clone(),
        category: remote.category.clone(),
    }
}
