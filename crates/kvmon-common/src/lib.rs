//! Shared types for the kvmon monitoring engine.
//!
//! Leaf crate with no internal dependencies; every other kvmon crate builds
//! on the types defined here.

pub mod types;
