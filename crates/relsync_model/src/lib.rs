//! # relsync model
//!
//! Data model shared by the relsync crates.
//!
//! This crate provides:
//! - [`Value`] - dynamic field and identifier component values
//! - [`EntityId`] - stable identity of a persisted entity
//! - [`Record`] - a related entity as seen through a relation
//! - [`Predicate`] - pure member-selection expressions handed to storage
//!
//! Nothing in this crate performs I/O. Predicates are built and evaluated
//! as plain values so they can be tested independently of any store.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod id;
mod predicate;
mod record;
mod value;

pub use id::EntityId;
pub use predicate::{Clause, Predicate};
pub use record::Record;
pub use value::Value;
