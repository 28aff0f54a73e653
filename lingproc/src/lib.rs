//! Linguistic processing utilities.
//!
//! This crate turns incrementally arriving text, such as the token stream of a
//! chat model, into sentences that are ready to be spoken.

pub mod segmenter;

pub use crate::segmenter::*;
