//! Top-level module for the segment chain generation system.
//!
//! This module provides:
//! - Language configuration (`Alphabet`)
//! - Word segmentation into vowel/consonant triplets (`Segmenter`)
//! - Chain construction and merging (`ChainBuilder`, `Accumulator`)
//! - The frozen chain itself (`ChainModel`)
//! - Random walks and length-bounded word sequences (`Sampler`, `Words`)
//! - Persistence (`codec`)
//! - A high-level generation interface (`WordGenerator`)

/// Vowel set and boundary marker of a language.
pub mod alphabet;

/// Splits marker-padded words into overlapping segment triplets.
pub mod segmenter;

/// Weighted and uniform candidate collections with their sampling policy.
pub mod candidates;

/// The immutable chain: start table, transition table and weighted flag.
pub mod chain_model;

/// Mutable accumulation of transition counts and freezing into a model.
///
/// Supports appending to an existing model and parallel construction.
pub mod builder;

/// Length window for generated words.
pub mod length_limit;

/// Random walks over a chain and the lazy word iterator.
pub mod sampler;

/// JSON and binary encodings of a chain.
pub mod codec;

/// High-level interface owning a chain and its random source.
///
/// Exposes seeding, appending, loading, saving and generation.
pub mod generator;
