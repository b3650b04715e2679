//! Reading FictionBook files back into a [`Book`](crate::book::Book).
//!
//! Used to inspect converted books (`kniga --info`) and to check that a
//! written book round-trips.

mod fb2;

pub use fb2::{read_fb2, read_fb2_file, read_fb2_zip};
