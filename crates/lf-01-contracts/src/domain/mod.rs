//! Contract rules, one module per contract family.

pub mod card;
pub mod constraints;
pub mod errors;
pub mod game;
