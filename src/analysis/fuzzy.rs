//! Weighted-ratio string similarity on a 0–100 scale.
//!
//! Strings are compared character by character with no case folding; token
//! based scorers split on whitespace.

use std::collections::BTreeSet;

/// Down-weighting applied to token based scores.
const UNBASE_SCALE: f64 = 0.95;

/// Best candidate returned by [`extract_one`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMatch<'a> {
    pub choice: &'a str,
    pub index: usize,
    pub score: f64,
}

/// Normalized indel similarity: `100 * (1 - indel_distance / (len1 + len2))`.
pub fn ratio(s1: &str, s2: &str) -> f64 {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    ratio_chars(&a, &b)
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    let distance = total - 2 * lcs_len(a, b);
    100.0 * (1.0 - distance as f64 / total as f64)
}

/// Length of the longest common subsequence, single-row DP.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Best [`ratio`] of the shorter string against any window of the longer one.
pub fn partial_ratio(s1: &str, s2: &str) -> f64 {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    if a.len() == b.len() {
        return partial_ratio_chars(&a, &b).max(partial_ratio_chars(&b, &a));
    }
    if a.len() < b.len() {
        partial_ratio_chars(&a, &b)
    } else {
        partial_ratio_chars(&b, &a)
    }
}

fn partial_ratio_chars(short: &[char], long: &[char]) -> f64 {
    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }
    let n = short.len();
    let m = long.len();
    let mut best: f64 = 0.0;

    // Windows hanging off the left edge.
    for end in 1..n {
        best = best.max(ratio_chars(short, &long[..end]));
    }
    for start in 0..=(m - n) {
        best = best.max(ratio_chars(short, &long[start..start + n]));
        if best >= 100.0 {
            return 100.0;
        }
    }
    // Windows hanging off the right edge.
    for start in (m - n + 1)..m {
        best = best.max(ratio_chars(short, &long[start..]));
    }
    best
}

fn sorted_tokens(s: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens
}

fn join_nonempty(left: &str, right: &str) -> String {
    match (left.is_empty(), right.is_empty()) {
        (true, _) => right.to_string(),
        (_, true) => left.to_string(),
        _ => format!("{left} {right}"),
    }
}

/// [`ratio`] after sorting the whitespace-separated tokens of each side.
pub fn token_sort_ratio(s1: &str, s2: &str) -> f64 {
    ratio(&sorted_tokens(s1).join(" "), &sorted_tokens(s2).join(" "))
}

/// Compare the shared tokens against each side's full token set.
/// 100 when one token set contains the other.
pub fn token_set_ratio(s1: &str, s2: &str) -> f64 {
    let t1: BTreeSet<&str> = s1.split_whitespace().collect();
    let t2: BTreeSet<&str> = s2.split_whitespace().collect();
    if t1.is_empty() || t2.is_empty() {
        return 0.0;
    }

    let sect: Vec<&str> = t1.intersection(&t2).copied().collect();
    let diff_ab: Vec<&str> = t1.difference(&t2).copied().collect();
    let diff_ba: Vec<&str> = t2.difference(&t1).copied().collect();

    if !sect.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 100.0;
    }

    let sect = sect.join(" ");
    let combined_ab = join_nonempty(&sect, &diff_ab.join(" "));
    let combined_ba = join_nonempty(&sect, &diff_ba.join(" "));

    let mut best = ratio(&combined_ab, &combined_ba);
    if !sect.is_empty() {
        best = best
            .max(ratio(&sect, &combined_ab))
            .max(ratio(&sect, &combined_ba));
    }
    best
}

/// Partial comparison over token sets. 100 as soon as one token is shared.
pub fn partial_token_ratio(s1: &str, s2: &str) -> f64 {
    let t1: BTreeSet<&str> = s1.split_whitespace().collect();
    let t2: BTreeSet<&str> = s2.split_whitespace().collect();
    if t1.is_empty() || t2.is_empty() {
        return 0.0;
    }
    if t1.intersection(&t2).next().is_some() {
        return 100.0;
    }

    let sorted = partial_ratio(&sorted_tokens(s1).join(" "), &sorted_tokens(s2).join(" "));
    let deduped = partial_ratio(
        &t1.into_iter().collect::<Vec<_>>().join(" "),
        &t2.into_iter().collect::<Vec<_>>().join(" "),
    );
    sorted.max(deduped)
}

/// Weighted ratio: picks the most suitable scorer for the length disparity
/// of the two strings. Returns 0 when either side is empty.
pub fn wratio(s1: &str, s2: &str) -> f64 {
    let len1 = s1.chars().count();
    let len2 = s2.chars().count();
    if len1 == 0 || len2 == 0 {
        return 0.0;
    }

    let len_ratio = len1.max(len2) as f64 / len1.min(len2) as f64;
    let end_ratio = ratio(s1, s2);

    if len_ratio < 1.5 {
        let token = token_sort_ratio(s1, s2).max(token_set_ratio(s1, s2));
        return end_ratio.max(token * UNBASE_SCALE);
    }

    let partial_scale = if len_ratio < 8.0 { 0.9 } else { 0.6 };
    end_ratio
        .max(partial_ratio(s1, s2) * partial_scale)
        .max(partial_token_ratio(s1, s2) * UNBASE_SCALE * partial_scale)
}

/// Score `query` against every choice with [`wratio`]; the first of equally
/// scoring choices wins. `None` when there are no choices.
pub fn extract_one<'a, I>(query: &str, choices: I) -> Option<BestMatch<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<BestMatch<'a>> = None;
    for (index, choice) in choices.into_iter().enumerate() {
        let score = wratio(query, choice);
        if best.map_or(true, |b| score > b.score) {
            best = Some(BestMatch {
                choice,
                index,
                score,
            });
        }
    }
    best
}
