//! # nutri-core
//!
//! Core types and validation for the nutri food-identity resolution core.
//!
//! This crate provides the foundational types shared across all nutri crates:
//! - [`CanonicalFoodResult`], the provider-agnostic nutrition record
//! - Provider, tier, and completeness enums
//! - Override and cache entry types, including purge scopes
//! - Barcode shape validation and query normalization
//! - Cross-cutting error types

pub mod cache;
pub mod enums;
pub mod errors;
pub mod food;
pub mod identity;
pub mod overrides;

pub use enums::{NutritionCompleteness, Provider, SourceTier};
pub use errors::CoreError;
pub use food::{CanonicalFoodResult, ConfidenceScore, Micronutrient};
