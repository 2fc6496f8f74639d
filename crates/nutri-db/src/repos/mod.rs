//! Repository modules for the three store tables.
//!
//! Each module adds methods to `NutriDb` via `impl NutriDb` blocks.

pub mod food_cache;
pub mod overrides;
pub mod search_cache;
