//! `invoicegen-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no IO): the error model,
//! money amounts with Indian-locale formatting, and GSTIN registration status.

pub mod error;
pub mod gstin;
pub mod money;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use gstin::{Gstin, Registration};
pub use money::{format_inr, Amount};
pub use value_object::ValueObject;
