//! Shared types for the presale program.
//!
//! Error taxonomy, amounts and time units, token identifiers and role-based
//! access checks used by the presale, vesting and custody services.

#![no_std]

extern crate alloc;

pub mod errors;
pub mod types;

pub use errors::*;
pub use types::*;
