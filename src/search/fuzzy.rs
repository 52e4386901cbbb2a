//! Token-level approximate matching.
//!
//! A query matches a candidate when every query token is within one edit
//! (insertion, deletion, substitution, or adjacent transposition) of some
//! word in the candidate's text. Matching produces both an ordered list of
//! candidate indexes (best first) and the plain set of matching indexes in
//! input order; callers fall back to the latter when the scores carry no
//! ordering signal.

use crate::search::normalize::tokenize;

/// Per-token edit tolerance. One typo per word.
const MAX_TOKEN_DISTANCE: usize = 1;

/// Result of matching a query against a candidate list.
#[derive(Debug, Clone, Default)]
pub struct FuzzyOutcome {
    /// Matching candidate indexes ordered best match first. Empty when the
    /// matcher could not distinguish match quality between candidates.
    pub ranked: Vec<usize>,
    /// All matching candidate indexes, in input order.
    pub matched: Vec<usize>,
}

impl FuzzyOutcome {
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }
}

/// Optimal-string-alignment distance with an early-exit cap. Counts
/// insertions, deletions, substitutions, and adjacent transpositions.
/// Returns `max_dist + 1` as soon as the distance provably exceeds the cap.
fn osa_distance_within(word: &str, token: &[char], max_dist: usize) -> usize {
    let word_chars: Vec<char> = word.chars().collect();
    let n = token.len();
    let m = word_chars.len();

    if n == 0 {
        return m.min(max_dist + 1);
    }
    if m.abs_diff(n) > max_dist {
        return max_dist + 1;
    }

    // Three DP rows: distances for word[..i-1], word[..i] vs token[..j].
    // The extra row is what makes transpositions visible.
    let mut prev2: Vec<usize> = vec![0; n + 1];
    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr: Vec<usize> = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        let mut row_min = curr[0];

        for j in 1..=n {
            let cost = if word_chars[i - 1] == token[j - 1] { 0 } else { 1 };
            let deletion = prev[j] + 1;
            let insertion = curr[j - 1] + 1;
            let substitution = prev[j - 1] + cost;
            let mut d = deletion.min(insertion).min(substitution);

            if i > 1
                && j > 1
                && word_chars[i - 1] == token[j - 2]
                && word_chars[i - 2] == token[j - 1]
            {
                d = d.min(prev2[j - 2] + 1);
            }

            curr[j] = d;
            row_min = row_min.min(d);
        }

        if row_min > max_dist {
            return max_dist + 1;
        }

        std::mem::swap(&mut prev2, &mut prev);
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Best distance between one query token and any word of the candidate,
/// or `None` if every word is more than one edit away.
fn best_token_match(token: &[char], words: &[String]) -> Option<usize> {
    words
        .iter()
        .map(|word| osa_distance_within(word, token, MAX_TOKEN_DISTANCE))
        .filter(|&d| d <= MAX_TOKEN_DISTANCE)
        .min()
}

/// Total edit cost of matching every query token against the candidate,
/// or `None` if any token fails the per-token tolerance.
fn candidate_score(query_tokens: &[Vec<char>], words: &[String]) -> Option<usize> {
    let mut total = 0;
    for token in query_tokens {
        total += best_token_match(token, words)?;
    }
    Some(total)
}

/// Match `query` against each candidate text.
///
/// Candidates where any query token finds no word within one edit are
/// excluded entirely. `ranked` orders survivors by total edit cost (ties
/// keep input order); it is left empty when every survivor scored the
/// same, since identical scores order nothing.
pub fn match_candidates(texts: &[String], query: &str) -> FuzzyOutcome {
    let query_tokens: Vec<Vec<char>> = tokenize(query)
        .into_iter()
        .map(|t| t.chars().collect())
        .collect();

    if query_tokens.is_empty() {
        return FuzzyOutcome::default();
    }

    let mut matched = Vec::new();
    let mut scores = Vec::new();
    for (index, text) in texts.iter().enumerate() {
        let words = tokenize(text);
        if let Some(score) = candidate_score(&query_tokens, &words) {
            matched.push(index);
            scores.push(score);
        }
    }

    let distinguishes = scores.windows(2).any(|pair| pair[0] != pair[1]);

    let ranked = if distinguishes {
        let mut pairs: Vec<(usize, usize)> =
            matched.iter().copied().zip(scores.iter().copied()).collect();
        // Stable sort: equal scores keep store relevance order.
        pairs.sort_by_key(|&(_, score)| score);
        pairs.into_iter().map(|(index, _)| index).collect()
    } else {
        Vec::new()
    };

    FuzzyOutcome { ranked, matched }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(word: &str, token: &str) -> usize {
        let chars: Vec<char> = token.chars().collect();
        osa_distance_within(word, &chars, MAX_TOKEN_DISTANCE)
    }

    #[test]
    fn test_distance_exact_and_single_edits() {
        assert_eq!(dist("game", "game"), 0);
        assert_eq!(dist("game", "gme"), 1); // deletion
        assert_eq!(dist("game", "gamme"), 1); // insertion
        assert_eq!(dist("game", "gane"), 1); // substitution
        assert_eq!(dist("game", "gmae"), 1); // transposition
    }

    #[test]
    fn test_distance_caps_out() {
        assert!(dist("game", "gnomes") > MAX_TOKEN_DISTANCE);
        assert!(dist("darkness", "dark") > MAX_TOKEN_DISTANCE);
    }

    #[test]
    fn test_match_tolerates_one_typo_per_token() {
        let texts = vec!["Ender's Game Orson Scott Card".to_string()];
        let outcome = match_candidates(&texts, "endres gmae");
        assert_eq!(outcome.matched, vec![0]);
    }

    #[test]
    fn test_unmatched_candidates_are_dropped() {
        let texts = vec![
            "Ender's Game Orson Scott Card".to_string(),
            "The Dispossessed Ursula K. Le Guin".to_string(),
        ];
        let outcome = match_candidates(&texts, "enders game");
        assert_eq!(outcome.matched, vec![0]);
    }

    #[test]
    fn test_equal_scores_yield_no_ranking() {
        let texts = vec![
            "Enders Game".to_string(),
            "Enders Game Alive".to_string(),
        ];
        let outcome = match_candidates(&texts, "enders game");
        assert_eq!(outcome.matched, vec![0, 1]);
        assert!(outcome.ranked.is_empty());
    }

    #[test]
    fn test_closer_match_ranks_first() {
        let texts = vec![
            "Endurance Alfred Lansing".to_string(),
            "Enders Game Orson Scott Card".to_string(),
        ];
        let outcome = match_candidates(&texts, "enders");
        // "endurance" is not within one edit of "enders"; only index 1 matches.
        assert_eq!(outcome.matched, vec![1]);

        let texts = vec![
            "Enders Gane".to_string(),
            "Enders Game".to_string(),
        ];
        let outcome = match_candidates(&texts, "enders game");
        assert_eq!(outcome.ranked, vec![1, 0]);
    }

    #[test]
    fn test_blank_query_matches_nothing() {
        let texts = vec!["Enders Game".to_string()];
        let outcome = match_candidates(&texts, "  !! ");
        assert!(outcome.is_empty());
    }
}
