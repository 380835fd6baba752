use sillage::{Frame, Probe, Tabulated, Traced};

pub static BINOM: Traced<(usize, usize), u64> = Traced::new("binom", binom);

fn binom(cx: &Frame<'_>, (n, k): (usize, usize)) -> u64 {
    if k == 0 || k == n {
        return 1;
    }
    cx.call(&BINOM, (n - 1, k - 1)) + cx.call(&BINOM, (n - 1, k))
}

pub static BINOM_ITER: Tabulated<(usize, usize), Vec<Vec<u64>>, u64> =
    Tabulated::new("binom_iter", binom_iter);

/// Pascal's triangle, `k + 1` columns wide. Expects `k <= n`.
fn binom_iter(probe: &Probe<'_, Vec<Vec<u64>>>, (n, k): (usize, usize)) -> u64 {
    let mut dp_table = vec![vec![0; k + 1]; n + 1];
    probe.observe(&dp_table);
    for j in 0..=k {
        dp_table[j][j] = 1;
        probe.observe(&dp_table);
    }
    for row in dp_table.iter_mut() {
        row[0] = 1;
    }
    probe.observe(&dp_table);
    for i in 1..=n {
        for j in 1..i.min(k + 1) {
            dp_table[i][j] = dp_table[i - 1][j - 1] + dp_table[i - 1][j];
            probe.observe(&dp_table);
        }
    }
    dp_table[n][k]
}

#[cfg(test)]
mod tests {
    use super::*;
    use sillage::{CallGraph, SnapshotRecorder};

    #[test]
    fn binom_five_two_is_ten() {
        let graph = CallGraph::new();
        assert_eq!(graph.trace(&BINOM, (5, 2)), 10);
        let root = graph.activations().remove(0);
        assert_eq!(root.arguments.render(), "5,2");
        assert_eq!(root.children.len(), 2);
    }

    #[test]
    fn binom_iter_matches_recursion() {
        let graph = CallGraph::new();
        let recorder = SnapshotRecorder::new("dp_table");
        for n in 1..=8 {
            for k in 0..=n {
                graph.reset();
                assert_eq!(
                    graph.trace(&BINOM, (n, k)),
                    recorder.run(&BINOM_ITER, (n, k)),
                    "binom({n}, {k})"
                );
            }
        }
    }

    #[test]
    fn binom_iter_final_snapshot_is_pascals_triangle() {
        let recorder = SnapshotRecorder::new("dp_table");
        assert_eq!(recorder.run(&BINOM_ITER, (4, 2)), 6);
        let last = recorder.sequence().last().expect("table recorded");
        assert_eq!(
            last,
            vec![vec![1, 0, 0], vec![1, 1, 0], vec![1, 2, 1], vec![1, 3, 3], vec![1, 4, 6]]
        );
    }
}
