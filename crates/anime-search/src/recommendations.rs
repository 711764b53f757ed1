//! Recommendation feed de-duplication.

use shared::{RecommendationEntry, MAX_RECOMMENDATIONS};
use std::collections::HashSet;

/// Keep the first entry for each primary title, in feed order, up to
/// `limit` entries (never more than [`MAX_RECOMMENDATIONS`]). Entries
/// without any title are dropped.
pub fn dedupe_recommendations(
    feed: impl IntoIterator<Item = RecommendationEntry>,
    limit: usize,
) -> Vec<RecommendationEntry> {
    let mut seen = HashSet::new();

    feed.into_iter()
        .filter(|rec| match rec.primary_entry() {
            Some(primary) => seen.insert(primary.mal_id),
            None => false,
        })
        .take(limit.min(MAX_RECOMMENDATIONS))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::AnimeSummary;

    fn rec(primary: u32, other: u32) -> RecommendationEntry {
        RecommendationEntry {
            mal_id: Some(format!("{}-{}", primary, other)),
            entry: vec![
                AnimeSummary::new(primary, format!("Anime {}", primary)),
                AnimeSummary::new(other, format!("Anime {}", other)),
            ],
            content: Some(format!("{} is like {}", primary, other)),
        }
    }

    fn primaries(recs: &[RecommendationEntry]) -> Vec<u32> {
        recs.iter()
            .filter_map(|r| r.primary_entry().map(|e| e.mal_id))
            .collect()
    }

    #[test]
    fn test_keeps_first_occurrence_in_order() {
        let feed = vec![rec(1, 2), rec(3, 4), rec(1, 9), rec(5, 6), rec(3, 1)];
        let unique = dedupe_recommendations(feed, MAX_RECOMMENDATIONS);

        assert_eq!(primaries(&unique), vec![1, 3, 5]);
        // First occurrence wins, including its blurb
        assert_eq!(unique[0].content.as_deref(), Some("1 is like 2"));
    }

    #[test]
    fn test_identity_is_primary_entry_only() {
        // Same secondary title, different primaries: both kept
        let feed = vec![rec(1, 7), rec(2, 7)];
        assert_eq!(primaries(&dedupe_recommendations(feed, 10)), vec![1, 2]);
    }

    #[test]
    fn test_caps_output() {
        let feed: Vec<_> = (0..40).map(|i| rec(i % 25, 1000)).collect();
        let unique = dedupe_recommendations(feed, MAX_RECOMMENDATIONS);

        assert_eq!(unique.len(), 10);
        assert_eq!(primaries(&unique), (0..10).collect::<Vec<_>>());

        let feed: Vec<_> = (0..40).map(|i| rec(i, 1000)).collect();
        assert_eq!(dedupe_recommendations(feed, 25).len(), MAX_RECOMMENDATIONS);
    }

    #[test]
    fn test_skips_entries_without_titles() {
        let empty = RecommendationEntry {
            mal_id: None,
            entry: vec![],
            content: None,
        };
        let feed = vec![empty.clone(), rec(4, 5), empty];
        assert_eq!(primaries(&dedupe_recommendations(feed, 10)), vec![4]);
        assert!(dedupe_recommendations(Vec::new(), 10).is_empty());
    }
}
