pub mod fixtures;
pub mod snapshot;

pub use snapshot::{assert_tree_eq, capture};
