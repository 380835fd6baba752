use std::ops::RangeInclusive;

use crate::AnyResult;

/// Accepted `n` and `k` for the numeric problems.
pub const SIZE_RANGE: RangeInclusive<usize> = 1..=10;

/// Longest sequence accepted for longest increasing subsequence; the
/// recursive form doubles its call count with every element.
pub const MAX_SEQUENCE_LEN: usize = 10;

/// Longest combined word length accepted for edit distance; the recursive
/// form triples its call count with every character.
pub const MAX_WORDS_LEN: usize = 8;

pub fn check_size(name: &str, value: usize) -> AnyResult<usize> {
    if SIZE_RANGE.contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "{name} must be between {} and {}, got {value}",
            SIZE_RANGE.start(),
            SIZE_RANGE.end()
        ))
    }
}

pub fn check_binom(n: usize, k: usize) -> AnyResult<(usize, usize)> {
    let n = check_size("n", n)?;
    let k = check_size("k", k)?;
    if k > n {
        return Err(format!("k must not exceed n, got n={n} k={k}"));
    }
    Ok((n, k))
}

/// Parses `3,1,4` (whitespace around items allowed).
pub fn parse_sequence(text: &str) -> AnyResult<Vec<i64>> {
    let sequence = text
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<i64>()
                .map_err(|e| format!("invalid sequence element {item:?}: {e}"))
        })
        .collect::<AnyResult<Vec<i64>>>()?;
    if sequence.is_empty() {
        return Err("sequence must contain at least one integer".to_owned());
    }
    if sequence.len() > MAX_SEQUENCE_LEN {
        return Err(format!(
            "sequence may hold at most {MAX_SEQUENCE_LEN} integers, got {}",
            sequence.len()
        ));
    }
    Ok(sequence)
}

pub fn check_words(from: &str, to: &str) -> AnyResult<(String, String)> {
    let len = from.chars().count() + to.chars().count();
    if len > MAX_WORDS_LEN {
        return Err(format!(
            "words may hold at most {MAX_WORDS_LEN} characters together, got {len}"
        ));
    }
    Ok((from.to_owned(), to.to_owned()))
}

pub fn check_frames(frames: Option<u32>) -> AnyResult<Option<u32>> {
    match frames {
        Some(0) => Err("frames must be at least 1".to_owned()),
        other => Ok(other),
    }
}
