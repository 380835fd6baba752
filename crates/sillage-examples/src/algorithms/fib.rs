use sillage::{Frame, Probe, Tabulated, Traced};

pub static FIB: Traced<usize, u64> = Traced::new("fib", fib);

fn fib(cx: &Frame<'_>, n: usize) -> u64 {
    if n == 0 {
        return 0;
    }
    if n == 1 {
        return 1;
    }
    cx.call(&FIB, n - 1) + cx.call(&FIB, n - 2)
}

pub static FIB_ITER: Tabulated<usize, Vec<u64>, u64> = Tabulated::new("fib_iter", fib_iter);

fn fib_iter(probe: &Probe<'_, Vec<u64>>, n: usize) -> u64 {
    let mut dp_table = vec![0; n + 1];
    probe.observe(&dp_table);
    if n == 0 {
        return 0;
    }
    dp_table[1] = 1;
    probe.observe(&dp_table);
    for i in 2..=n {
        dp_table[i] = dp_table[i - 1] + dp_table[i - 2];
        probe.observe(&dp_table);
    }
    dp_table[n]
}
