pub mod checkpoint;
pub mod error;
pub mod wire;
