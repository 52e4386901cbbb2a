//! Quality ranking for search results.
//!
//! Candidates arrive pre-ordered by the store's relevance score. That
//! ordering misses typos; the fuzzy matcher alone ignores corpus signals
//! like edition count that the store ordering bakes in. Multiplying the
//! two 1-based rank positions penalizes candidates that either signal
//! ranks poorly, without needing score normalization. The exact formula
//! is a tunable heuristic, not a contract.

use tracing::debug;

use crate::models::{BookCandidate, PersonCandidate};
use crate::search::fuzzy::match_candidates;
use crate::search::normalize::{loosely_equal, names_loosely_equal};

/// A record that can be quality-ranked and deduplicated.
pub trait Rankable {
    /// Text the fuzzy matcher runs against, e.g. "title author" or "name".
    fn search_text(&self) -> String;
    /// Primary dedup field (title, or display name for people).
    fn dedup_primary(&self) -> &str;
    /// Secondary dedup field (author name, or handle for people).
    fn dedup_secondary(&self) -> &str;
}

impl Rankable for BookCandidate {
    fn search_text(&self) -> String {
        format!("{} {}", self.title, self.author_name)
    }

    fn dedup_primary(&self) -> &str {
        &self.title
    }

    fn dedup_secondary(&self) -> &str {
        &self.author_name
    }
}

impl Rankable for PersonCandidate {
    fn search_text(&self) -> String {
        format!("{} {}", self.display_name, self.handle)
    }

    fn dedup_primary(&self) -> &str {
        &self.display_name
    }

    fn dedup_secondary(&self) -> &str {
        &self.handle
    }
}

/// Re-rank relevance-ordered candidates against `query`.
///
/// Candidates the fuzzy matcher rejects are dropped, so the output is
/// always a subset of the input. When the matcher produces no usable
/// ordering, matched candidates keep their store relevance order.
pub fn rank_by_quality<T: Rankable>(candidates: Vec<T>, query: &str) -> Vec<T> {
    if candidates.is_empty() {
        return candidates;
    }

    let texts: Vec<String> = candidates.iter().map(Rankable::search_text).collect();
    let outcome = match_candidates(&texts, query);

    let fuzzy_order = if outcome.ranked.is_empty() {
        // No ordering signal from the matcher; the matched set in source
        // order still carries the store relevance ranking.
        outcome.matched
    } else {
        outcome.ranked
    };

    if fuzzy_order.is_empty() {
        debug!(query, total = candidates.len(), "no fuzzy matches");
        return Vec::new();
    }

    // score = (original rank + 1) * (fuzzy rank + 1), lower is better.
    let mut scored: Vec<(usize, usize)> = fuzzy_order
        .iter()
        .enumerate()
        .map(|(fuzzy_index, &original_index)| {
            (original_index, (original_index + 1) * (fuzzy_index + 1))
        })
        .collect();
    scored.sort_by_key(|&(_, score)| score);

    let mut slots: Vec<Option<T>> = candidates.into_iter().map(Some).collect();
    let ordered: Vec<T> = scored
        .into_iter()
        .filter_map(|(index, _)| slots[index].take())
        .collect();

    dedup_loose(ordered)
}

/// Collapse candidates whose primary AND secondary dedup fields both
/// loosely equal an earlier survivor's, keeping the first occurrence.
/// Runs after ranking, so "first" means "best". Idempotent.
pub fn dedup_loose<T: Rankable>(items: Vec<T>) -> Vec<T> {
    let mut kept: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        let duplicate = kept.iter().any(|seen| {
            loosely_equal(seen.dedup_primary(), item.dedup_primary())
                && names_loosely_equal(seen.dedup_secondary(), item.dedup_secondary())
        });
        if !duplicate {
            kept.push(item);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: i64, title: &str, author: &str) -> BookCandidate {
        BookCandidate {
            id,
            title: title.to_string(),
            author_name: author.to_string(),
            cover_url: None,
            edition_count: 1,
            first_published_year: None,
            relevance: 0.0,
        }
    }

    #[test]
    fn test_duplicate_editions_collapse_to_first() {
        let candidates = vec![
            book(1, "Ender's Game", "Orson Scott Card"),
            book(2, "Enders Game", "O.S. Card"),
        ];
        let ranked = rank_by_quality(candidates, "enders game");
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, 1);
    }

    #[test]
    fn test_output_is_subset_of_input() {
        let candidates = vec![
            book(1, "Ender's Game", "Orson Scott Card"),
            book(2, "The Player of Games", "Iain M. Banks"),
            book(3, "Endgame", "Samuel Beckett"),
        ];
        let input_ids: Vec<i64> = candidates.iter().map(|c| c.id).collect();
        let ranked = rank_by_quality(candidates, "ender game");
        assert!(!ranked.is_empty());
        for candidate in &ranked {
            assert!(input_ids.contains(&candidate.id));
        }
    }

    #[test]
    fn test_confident_store_match_can_be_dropped() {
        // The store's top hit fails the fuzzy filter entirely; accepted
        // behavior is to exclude it rather than rescue it.
        let candidates = vec![
            book(1, "Ansible Networking Handbook", "Pat Ops"),
            book(2, "Enders Game", "Orson Scott Card"),
        ];
        let ranked = rank_by_quality(candidates, "enders game");
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, 2);
    }

    #[test]
    fn test_multiplicative_score_combines_both_signals() {
        // Index 0 by store relevance, but a worse fuzzy match than index 1.
        // (1)*(2)=2 for the store favorite vs (2)*(1)=2 for the fuzzy
        // favorite: tie keeps assembled order, fuzzy-best first.
        let candidates = vec![
            book(1, "Enders Gane", "O S Card"),
            book(2, "Enders Game", "Orson Scott Card"),
        ];
        let ranked = rank_by_quality(candidates, "enders game");
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, 2);
    }

    #[test]
    fn test_no_match_returns_empty() {
        let candidates = vec![book(1, "Middlemarch", "George Eliot")];
        let ranked = rank_by_quality(candidates, "ender");
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let items = vec![
            book(1, "Ender's Game", "Orson Scott Card"),
            book(2, "Enders Game", "orson scott card"),
            book(3, "Speaker for the Dead", "Orson Scott Card"),
        ];
        let once = dedup_loose(items);
        let once_ids: Vec<i64> = once.iter().map(|c| c.id).collect();
        let twice = dedup_loose(once);
        let twice_ids: Vec<i64> = twice.iter().map(|c| c.id).collect();
        assert_eq!(once_ids, vec![1, 3]);
        assert_eq!(once_ids, twice_ids);
    }

    #[test]
    fn test_same_title_different_author_survives() {
        let items = vec![
            book(1, "Collected Poems", "W. B. Yeats"),
            book(2, "Collected Poems", "Sylvia Plath"),
        ];
        assert_eq!(dedup_loose(items).len(), 2);
    }
}
