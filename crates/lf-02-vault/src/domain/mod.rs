pub mod errors;
pub mod index;
