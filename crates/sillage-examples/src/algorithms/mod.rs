//! Recursive and tabulated forms of the demonstrated problems.
//!
//! Recursive forms are [`Traced`](sillage::Traced) statics and show up in the
//! call graph; tabulated forms are [`Tabulated`](sillage::Tabulated) statics
//! that report their `dp_table` after every write.

mod binom;
mod edit_distance;
mod fib;
mod lis;

pub use binom::{BINOM, BINOM_ITER};
pub use edit_distance::{EDIT_DISTANCE, EDIT_DISTANCE_ITER};
pub use fib::{FIB, FIB_ITER};
pub use lis::{LIS, LIS_ITER};

/// Name under which every tabulated form reports its table.
pub const DP_TABLE: &str = "dp_table";
