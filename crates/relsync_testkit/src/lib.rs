//! # relsync testkit
//!
//! Test utilities for relsync.
//!
//! This crate provides:
//! - An `Order` fixture entity wired to a [`relsync_storage::MemoryStore`]
//! - Call recorders for overrides and hooks
//! - Property-based test generators using proptest
//! - Test logging setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relsync_testkit::prelude::*;
//!
//! #[test]
//! fn prunes_tags() {
//!     let fixture = OrderFixture::with_tags(&[1, 2, 3]);
//!     let removed = fixture.reconcile_tags(&[2]).unwrap();
//!     assert_eq!(removed, 2);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
