use std::fmt::{self, Display};

/// Scalars that can sit in a displayed table cell.
pub trait TableCell: Display {}

macro_rules! table_cells {
    ($($ty:ty),*) => {
        $(impl TableCell for $ty {})*
    };
}

table_cells!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f64);

/// Fixed-width text for a one- or two-dimensional table snapshot.
///
/// ```
/// use sillage_render::TableText;
///
/// assert_eq!(vec![0u64, 1, 12].table_text(), "[  0,  1, 12]");
/// assert_eq!(
///     vec![vec![1u64, 0], vec![1, 1]].table_text(),
///     "[[  1,  0],\n [  1,  1]]"
/// );
/// ```
pub trait TableText {
    fn table_text(&self) -> String;
}

/// One bracketed row of right-aligned cells.
struct Row<'a, T>(&'a [T]);

impl<T: TableCell> Display for Row<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (index, cell) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{cell:>3}")?;
        }
        f.write_str("]")
    }
}

impl<T: TableCell> TableText for [T] {
    fn table_text(&self) -> String {
        Row(self).to_string()
    }
}

impl<T: TableCell> TableText for Vec<T> {
    fn table_text(&self) -> String {
        self.as_slice().table_text()
    }
}

impl<T: TableCell> TableText for [Vec<T>] {
    fn table_text(&self) -> String {
        let rows: Vec<String> = self
            .iter()
            .map(|row| Row(row.as_slice()).to_string())
            .collect();
        format!("[{}]", rows.join(",\n "))
    }
}

impl<T: TableCell> TableText for Vec<Vec<T>> {
    fn table_text(&self) -> String {
        self.as_slice().table_text()
    }
}
