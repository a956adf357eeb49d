//! Fuzzy "did you mean" candidates for unknown-identifier diagnostics.
//!
//! Plain Levenshtein distance with a cutoff scaled to the misspelled name's
//! length. The reserved root name `Storage` is never offered as a candidate.

use crate::checker::ROOT_NAME;

/// Levenshtein edit distance.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (m, n) = (a.len(), b.len());

    let mut dp = vec![vec![0usize; n + 1]; m + 1];
    for (i, row) in dp.iter_mut().enumerate().take(m + 1) {
        row[0] = i;
    }
    for (j, cell) in dp[0].iter_mut().enumerate().take(n + 1) {
        *cell = j;
    }
    for i in 1..=m {
        for j in 1..=n {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            dp[i][j] = (dp[i - 1][j] + 1)
                .min(dp[i][j - 1] + 1)
                .min(dp[i - 1][j - 1] + cost);
        }
    }
    dp[m][n]
}

/// Candidate names within the distance cutoff, ranked by distance (closest
/// first), ties broken alphabetically.
pub fn suggest<I, S>(name: &str, candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let max_distance = 3.min(name.chars().count().div_ceil(2));

    let mut scored: Vec<(usize, String)> = candidates
        .into_iter()
        .filter(|c| c.as_ref() != name && c.as_ref() != ROOT_NAME)
        .filter_map(|c| {
            let dist = edit_distance(name, c.as_ref());
            (dist <= max_distance).then(|| (dist, c.as_ref().to_string()))
        })
        .collect();

    scored.sort();
    scored.dedup_by(|a, b| a.1 == b.1);
    scored.into_iter().map(|(_, name)| name).collect()
}

/// The single closest candidate, if any.
pub fn best_suggestion<I, S>(name: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    suggest(name, candidates).into_iter().next()
}
