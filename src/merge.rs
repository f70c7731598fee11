//! Union of community posts and linked posts

use crate::normalize::normalize;
use crate::types::{NormalizedRecord, RawRecord};
use std::collections::HashSet;
use tracing::info;

/// Normalize community posts and union them with linked posts
///
/// Community posts come first, then linked posts. The first record seen for an
/// identifier wins outright; later duplicates, within or across the two
/// inputs, are dropped rather than field-merged. Records without an
/// identifier are dropped.
pub fn merge(community: &[RawRecord], linked: &[NormalizedRecord]) -> Vec<NormalizedRecord> {
    let normalized = community.iter().map(normalize);
    let merged = dedupe(normalized.chain(linked.iter().cloned()));

    info!(
        community = community.len(),
        linked = linked.len(),
        merged = merged.len(),
        "Merged community and linked posts"
    );
    merged
}

/// First-seen-wins deduplication by identifier, order preserved
pub fn dedupe(records: impl IntoIterator<Item = NormalizedRecord>) -> Vec<NormalizedRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| match record.id.as_deref() {
            Some(id) if !id.is_empty() => seen.insert(id.to_string()),
            _ => false,
        })
        .collect()
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(id: &str, likes: u64) -> RawRecord {
        json!({ "id_str": id, "favorite_count": likes, "user": { "screen_name": "a" } })
    }

    fn ids(records: &[NormalizedRecord]) -> Vec<&str> {
        records.iter().filter_map(|r| r.id.as_deref()).collect()
    }

    #[test]
    fn community_first_then_links_in_order() {
        let community = vec![raw("1", 0), raw("2", 0)];
        let linked = vec![normalize(&raw("3", 0)), normalize(&raw("4", 0))];

        let merged = merge(&community, &linked);

        assert_eq!(ids(&merged), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn first_seen_wins_across_inputs() {
        let community = vec![raw("1", 5)];
        let linked = vec![normalize(&raw("1", 999)), normalize(&raw("2", 1))];

        let merged = merge(&community, &linked);

        assert_eq!(ids(&merged), vec!["1", "2"]);
        assert_eq!(merged[0].metrics.likes, 5, "later duplicate dropped entirely");
    }

    #[test]
    fn duplicates_within_one_input_are_dropped() {
        let community = vec![raw("1", 1), raw("1", 2)];
        let linked = vec![normalize(&raw("2", 1)), normalize(&raw("2", 2))];

        let merged = merge(&community, &linked);

        assert_eq!(ids(&merged), vec!["1", "2"]);
        assert_eq!(merged[0].metrics.likes, 1);
        assert_eq!(merged[1].metrics.likes, 1);
    }

    #[test]
    fn records_without_id_are_dropped() {
        let community = vec![json!({ "text": "anonymous" }), raw("1", 0)];

        let merged = merge(&community, &[]);

        assert_eq!(ids(&merged), vec!["1"]);
    }

    #[test]
    fn merge_is_idempotent() {
        let community = vec![raw("1", 1), raw("2", 2), raw("1", 3)];
        let linked = vec![normalize(&raw("3", 0)), normalize(&raw("2", 7))];

        let once = merge(&community, &linked);
        let again = merge(&community, &linked);
        assert_eq!(once, again);

        // Feeding the output back in as the linked input adds nothing
        let fed_back = merge(&community, &once);
        assert_eq!(fed_back, once);
        let only_output = merge(&[], &once);
        assert_eq!(only_output, once);
    }
}
