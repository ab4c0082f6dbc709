//! Segment-chain word generation library.
//!
//! Words are cut into vowel runs and the consonant runs between them. A
//! Markov chain over those segments, learned from a vocabulary, produces new
//! strings that follow the feel of the input language.
//!
//! This crate provides:
//! - Segmentation and chain construction (weighted or unweighted)
//! - Length-bounded random generation
//! - A stable JSON model format and a compact binary cache
//! - Internal utilities for I/O and path handling

/// Segment chain models and generation logic.
pub mod model;

/// Error type shared by every operation.
pub mod error;

/// I/O utilities (word lists, path helpers).
pub mod io;

pub use error::{Error, Result};
pub use model::alphabet::Alphabet;
pub use model::codec::ModelFormat;
pub use model::generator::{Seed, WordGenerator};
pub use model::length_limit::LengthLimit;
