use sillage::{Frame, Probe, Tabulated, Traced};
use tracing::warn;

pub static LIS: Traced<Vec<i64>, u64> = Traced::new("lis", lis);
pub static LIS_SMALLER: Traced<(Vec<i64>, f64), u64> = Traced::new("lis_smaller", lis_smaller);

fn lis(cx: &Frame<'_>, sequence: Vec<i64>) -> u64 {
    cx.call(&LIS_SMALLER, (sequence, f64::INFINITY))
}

/// Longest increasing subsequence of `sequence` whose elements are all
/// below `bound`.
fn lis_smaller(cx: &Frame<'_>, (sequence, bound): (Vec<i64>, f64)) -> u64 {
    let Some((&last, rest)) = sequence.split_last() else {
        return 0;
    };
    let skip = cx.call(&LIS_SMALLER, (rest.to_vec(), bound));
    annotate(cx, "skip", skip);
    if (last as f64) >= bound {
        return skip;
    }
    let take = 1 + cx.call(&LIS_SMALLER, (rest.to_vec(), last as f64));
    annotate(cx, "take", take);
    skip.max(take)
}

fn annotate(cx: &Frame<'_>, key: &'static str, value: u64) {
    if let Err(err) = cx.track([(key, value)]) {
        warn!(%err, function = cx.function_name(), "annotation dropped");
    }
}

pub static LIS_ITER: Tabulated<Vec<i64>, Vec<Vec<u64>>, u64> = Tabulated::new("lis_iter", lis_iter);

/// Row `i - 1`, column `j - 1` holds the longest increasing subsequence of
/// the first `i` elements that stays below element `j`. Column `n` stands
/// for an unbounded element past the end.
fn lis_iter(probe: &Probe<'_, Vec<Vec<u64>>>, sequence: Vec<i64>) -> u64 {
    let n = sequence.len();
    if n == 0 {
        return 0;
    }
    let mut dp_table = vec![vec![0; n + 1]; n];
    probe.observe(&dp_table);
    for i in 1..=n {
        for j in (i + 1)..=(n + 1) {
            let skip = row_above(&dp_table, i, j - 1);
            let blocked = sequence
                .get(j - 1)
                .is_some_and(|&bound| sequence[i - 1] >= bound);
            dp_table[i - 1][j - 1] = if blocked {
                skip
            } else {
                skip.max(1 + row_above(&dp_table, i, i - 1))
            };
            probe.observe(&dp_table);
        }
    }
    dp_table[n - 1][n]
}

/// The previous row's cell, or 0 above the first row.
fn row_above(dp_table: &[Vec<u64>], i: usize, column: usize) -> u64 {
    if i >= 2 { dp_table[i - 2][column] } else { 0 }
}
