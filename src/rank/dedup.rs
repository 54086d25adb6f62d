//! Deduplicating accumulator.
//!
//! Items are keyed by normalized URL, else normalized title. When a key
//! repeats, the copy with the higher relevance survives and the
//! contributing-source list is the union of both, so provenance is never
//! lost. Each entry remembers the best (lowest) priority of the sources
//! that returned it and the order in which it was first seen; both are
//! tie-breakers for the final ordering.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::url_normalize::normalize_url;
use crate::text::normalize_title;
use crate::types::SearchResultItem;

/// Deduplication key of an item.
pub fn dedup_key(item: &SearchResultItem) -> String {
    if let Some(url) = item.url.as_deref().filter(|u| !u.trim().is_empty()) {
        return format!("url:{}", normalize_url(url));
    }
    let title = normalize_title(&item.title);
    if !title.is_empty() {
        return format!("title:{title}");
    }
    let head: String = item.content.chars().take(200).collect();
    format!("content:{}", normalize_title(&head))
}

#[derive(Debug, Clone)]
struct Entry {
    item: SearchResultItem,
    priority: u32,
    discovery: usize,
}

/// Accumulates results across priority groups.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    entries: Vec<Entry>,
    by_key: HashMap<String, usize>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct items held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge `items` from a source with the given priority.
    pub fn absorb(&mut self, items: Vec<SearchResultItem>, priority: u32) {
        for item in items {
            let key = dedup_key(&item);
            match self.by_key.get(&key) {
                Some(&idx) => Self::merge_into(&mut self.entries[idx], item, priority),
                None => {
                    self.by_key.insert(key, self.entries.len());
                    let discovery = self.entries.len();
                    self.entries.push(Entry {
                        item,
                        priority,
                        discovery,
                    });
                }
            }
        }
    }

    fn merge_into(entry: &mut Entry, incoming: SearchResultItem, priority: u32) {
        let mut sources = entry.item.metadata.contributing_sources.clone();
        for source in &incoming.metadata.contributing_sources {
            if !sources.contains(source) {
                sources.push(*source);
            }
        }

        if incoming.relevance > entry.item.relevance {
            let previous = std::mem::replace(&mut entry.item, incoming);
            if entry.item.url.is_none() {
                entry.item.url = previous.url;
            }
            if entry.item.metadata.published_at.is_none() {
                entry.item.metadata.published_at = previous.metadata.published_at;
            }
        } else {
            if entry.item.url.is_none() {
                entry.item.url = incoming.url;
            }
            if entry.item.metadata.published_at.is_none() {
                entry.item.metadata.published_at = incoming.metadata.published_at;
            }
        }

        entry.item.metadata.contributing_sources = sources;
        entry.priority = entry.priority.min(priority);
    }

    /// Items in final order without consuming the accumulator.
    pub fn ranked(&self) -> Vec<SearchResultItem> {
        let mut entries: Vec<&Entry> = self.entries.iter().collect();
        entries.sort_by(|a, b| compare(a, b));
        entries.into_iter().map(|e| e.item.clone()).collect()
    }

    /// Items in final order: relevance descending, then source priority
    /// ascending, then first-seen order.
    pub fn into_ranked(mut self) -> Vec<SearchResultItem> {
        self.entries.sort_by(compare);
        self.entries.into_iter().map(|e| e.item).collect()
    }
}

fn compare(a: &Entry, b: &Entry) -> Ordering {
    b.item
        .relevance
        .total_cmp(&a.item.relevance)
        .then(a.priority.cmp(&b.priority))
        .then(a.discovery.cmp(&b.discovery))
}
