pub mod uniqueness;
pub mod verdict;
