// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use crate::config::SourceConfig;
use crate::feed::{Entry, FeedClient};
use std::future::Future;
use tracing::debug;

/// Anything that can look up the newest entry of a source.
pub trait LatestEntry {
    fn latest(&self, source: &SourceConfig) -> impl Future<Output = Option<Entry>>;
}

impl LatestEntry for FeedClient {
    fn latest(&self, source: &SourceConfig) -> impl Future<Output = Option<Entry>> {
        self.fetch_latest(source)
    }
}

/// Every source came back empty or failed.
#[derive(Debug)]
pub struct NoCandidates;

impl std::fmt::Display for NoCandidates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "No videos found in any playlist.")
    }
}

impl std::error::Error for NoCandidates {}

/// Query each source in turn, drop the absent ones and order the rest
/// newest first.
pub async fn aggregate<F: LatestEntry>(
    fetcher: &F,
    sources: &[SourceConfig],
) -> Result<Vec<Entry>, NoCandidates> {
    let mut entries = Vec::with_capacity(sources.len());

    for source in sources {
        if let Some(entry) = fetcher.latest(source).await {
            entries.push(entry);
        }
    }

    debug!("{} of {} sources produced an entry", entries.len(), sources.len());

    if entries.is_empty() {
        return Err(NoCandidates);
    }

    order_candidates(&mut entries);
    Ok(entries)
}

/// Sort by `published` descending using plain string comparison. Empty
/// timestamps compare smallest and therefore land last.
pub fn order_candidates(entries: &mut [Entry]) {
    entries.sort_by(|a, b| b.published.cmp(&a.published));
}
