use std::collections::BTreeSet;

use crate::error::{Error, Result};

/// Default boundary marker.
///
/// It must never appear inside a training word.
pub const MARKER: char = '~';

/// The vowels of the English alphabet.
pub const ENGLISH_VOWELS: &str = "aeiou";

/// Language configuration shared by the segmenter and the builder.
///
/// An `Alphabet` partitions characters into vowels and non-vowels. The
/// boundary marker always counts as a vowel, so a marker-padded word starts
/// and ends with a vowel run.
///
/// # Invariants
/// - `vowels` contains the marker and at least one other character
/// - All vowels are lower-case (input words are lower-cased before use)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alphabet {
	vowels: BTreeSet<char>,
	marker: char,
}

impl Alphabet {
	/// Creates an alphabet from a set of vowels and a boundary marker.
	///
	/// # Errors
	/// Returns a configuration error if no vowel besides the marker is given,
	/// or if the marker is whitespace (input lines are trimmed, so it could
	/// never delimit a word).
	pub fn new<I: IntoIterator<Item = char>>(vowels: I, marker: char) -> Result<Self> {
		if marker.is_whitespace() {
			return Err(Error::Configuration("The boundary marker cannot be whitespace".to_owned()));
		}

		let mut vowels: BTreeSet<char> = vowels
			.into_iter()
			.flat_map(char::to_lowercase)
			.filter(|c| *c != marker)
			.collect();
		if vowels.is_empty() {
			return Err(Error::Configuration("The vowel set cannot be empty".to_owned()));
		}
		vowels.insert(marker);

		Ok(Self { vowels, marker })
	}

	/// English vowels with the default marker.
	pub fn english() -> Self {
		Self {
			vowels: ENGLISH_VOWELS.chars().chain([MARKER]).collect(),
			marker: MARKER,
		}
	}

	/// Returns the boundary marker.
	pub fn marker(&self) -> char {
		self.marker
	}

	/// Returns `true` if `c` is a vowel (the marker included).
	pub fn is_vowel(&self, c: char) -> bool {
		self.vowels.contains(&c)
	}

	/// Iterates over the vowels, the marker included.
	pub fn vowels(&self) -> impl Iterator<Item = char> + '_ {
		self.vowels.iter().copied()
	}
}

impl Default for Alphabet {
	fn default() -> Self {
		Self::english()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_marker_is_a_vowel() {
		let alphabet = Alphabet::new("ae".chars(), '#').unwrap();
		assert!(alphabet.is_vowel('a'));
		assert!(alphabet.is_vowel('#'));
		assert!(!alphabet.is_vowel('b'));
		assert_eq!(alphabet.marker(), '#');
	}

	#[test]
	fn test_vowels_are_lowercased() {
		let alphabet = Alphabet::new("AEI".chars(), MARKER).unwrap();
		assert!(alphabet.is_vowel('a'));
		assert!(!alphabet.is_vowel('A'));
	}

	#[test]
	fn test_empty_vowel_set_is_rejected() {
		assert!(matches!(Alphabet::new("".chars(), MARKER), Err(Error::Configuration(_))));
		// The marker alone does not count
		assert!(matches!(Alphabet::new("~".chars(), MARKER), Err(Error::Configuration(_))));
	}

	#[test]
	fn test_whitespace_marker_is_rejected() {
		assert!(matches!(Alphabet::new("a".chars(), ' '), Err(Error::Configuration(_))));
	}

	#[test]
	fn test_english_matches_new() {
		assert_eq!(Alphabet::english(), Alphabet::new(ENGLISH_VOWELS.chars(), MARKER).unwrap());
	}
}
