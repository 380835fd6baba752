use sillage::{Frame, Probe, Tabulated, Traced};

pub static EDIT_DISTANCE: Traced<(String, String), u64> =
    Traced::new("edit_distance", edit_distance);

fn split_last_char(word: &str) -> Option<(&str, char)> {
    word.char_indices()
        .next_back()
        .map(|(index, last)| (&word[..index], last))
}

fn edit_distance(cx: &Frame<'_>, (from, to): (String, String)) -> u64 {
    let (Some((from_rest, from_last)), Some((to_rest, to_last))) =
        (split_last_char(&from), split_last_char(&to))
    else {
        return (from.chars().count() + to.chars().count()) as u64;
    };
    let insert = 1 + cx.call(&EDIT_DISTANCE, (from.clone(), to_rest.to_owned()));
    let delete = 1 + cx.call(&EDIT_DISTANCE, (from_rest.to_owned(), to.clone()));
    let replace = u64::from(from_last != to_last)
        + cx.call(&EDIT_DISTANCE, (from_rest.to_owned(), to_rest.to_owned()));
    insert.min(delete).min(replace)
}

pub static EDIT_DISTANCE_ITER: Tabulated<(String, String), Vec<Vec<u64>>, u64> =
    Tabulated::new("edit_distance_iter", edit_distance_iter);

fn edit_distance_iter(probe: &Probe<'_, Vec<Vec<u64>>>, (from, to): (String, String)) -> u64 {
    let from: Vec<char> = from.chars().collect();
    let to: Vec<char> = to.chars().collect();
    let (m, n) = (from.len(), to.len());

    let mut dp_table = vec![vec![0; n + 1]; m + 1];
    probe.observe(&dp_table);
    for j in 0..=n {
        dp_table[0][j] = j as u64;
        probe.observe(&dp_table);
    }
    for i in 1..=m {
        dp_table[i][0] = i as u64;
        probe.observe(&dp_table);
        for j in 1..=n {
            let insert = dp_table[i][j - 1] + 1;
            let delete = dp_table[i - 1][j] + 1;
            let replace = dp_table[i - 1][j - 1] + u64::from(from[i - 1] != to[j - 1]);
            dp_table[i][j] = insert.min(delete).min(replace);
            probe.observe(&dp_table);
        }
    }
    dp_table[m][n]
}
