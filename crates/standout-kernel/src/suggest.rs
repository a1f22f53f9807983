//! "Did you mean" suggestions for unknown command names.

/// Default maximum edit distance for suggestions.
pub const DEFAULT_SUGGESTION_DISTANCE: usize = 3;

/// Returns the candidates within `max_distance` edits of `name`.
///
/// Closest first; ties are ordered by name. Duplicates are dropped.
///
/// ```rust
/// use standout_kernel::suggest;
///
/// let found = suggest("itall", ["install", "greet"], 3);
/// assert_eq!(found, vec!["install"]);
/// ```
pub fn suggest<'a, I>(name: &str, candidates: I, max_distance: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut scored: Vec<(usize, &str)> = candidates
        .into_iter()
        .map(|candidate| (strsim::levenshtein(name, candidate), candidate))
        .filter(|(distance, _)| *distance <= max_distance)
        .collect();

    scored.sort_unstable();
    scored.dedup_by(|a, b| a.1 == b.1);
    scored.into_iter().map(|(_, c)| c.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_match() {
        assert_eq!(suggest("itall", ["install", "greet"], 3), vec!["install"]);
    }

    #[test]
    fn test_no_match() {
        assert!(suggest("completely-different", ["install", "greet"], 3).is_empty());
    }

    #[test]
    fn test_ordered_by_distance_then_name() {
        let found = suggest("make", ["makes", "bake", "take", "maker2"], 2);
        assert_eq!(found, vec!["bake", "makes", "take", "maker2"]);
    }

    #[test]
    fn test_exact_distance_bound() {
        assert_eq!(suggest("abc", ["abcdef"], 3), vec!["abcdef"]);
        assert!(suggest("abc", ["abcdefg"], 3).is_empty());
    }
}
