use super::alphabet::Alphabet;
use super::chain_model::Successor;
use crate::error::{Error, Result};

/// One `(leading vowels, consonants, trailing vowels)` slice of a word.
///
/// Consecutive triplets overlap: the `trailing` run of one triplet is the
/// `leading` run of the next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Triplet {
	pub leading: String,
	pub middle: String,
	pub trailing: String,
}

impl Triplet {
	/// Splits the triplet into its chain key and the successor it leads to.
	pub fn into_transition(self) -> (String, Successor) {
		(self.leading, Successor::new(self.middle, self.trailing))
	}
}

/// Splits words into vowel/consonant segment triplets.
///
/// The word is padded with the marker on both ends and cut into maximal runs
/// of vowels and non-vowels. Because the marker is a vowel the runs always
/// read `V C V ... C V`, and every consonant run gives one triplet with its
/// neighbouring vowel runs.
///
/// A word made only of vowels has a single run. It yields one triplet with an
/// empty middle, `(marker, "", word + marker)`, so it can still start and end
/// a chain.
#[derive(Clone, Debug)]
pub struct Segmenter {
	alphabet: Alphabet,
}

impl Segmenter {
	pub fn new(alphabet: Alphabet) -> Self {
		Self { alphabet }
	}

	pub fn alphabet(&self) -> &Alphabet {
		&self.alphabet
	}

	/// Segments a single (already normalized) word.
	///
	/// # Errors
	/// Returns a configuration error if the word contains the marker.
	pub fn segment(&self, word: &str) -> Result<Vec<Triplet>> {
		let marker = self.alphabet.marker();
		if word.contains(marker) {
			return Err(Error::Configuration(format!(
				"Word {:?} contains the boundary marker {:?}",
				word, marker
			)));
		}

		if word.is_empty() {
			return Ok(Vec::new());
		}

		let runs = self.runs(word);
		if runs.len() == 1 {
			let mut trailing = word.to_owned();
			trailing.push(marker);
			return Ok(vec![Triplet {
				leading: marker.to_string(),
				middle: String::new(),
				trailing,
			}]);
		}

		Ok(runs
			.windows(3)
			.step_by(2)
			.map(|w| Triplet {
				leading: w[0].clone(),
				middle: w[1].clone(),
				trailing: w[2].clone(),
			})
			.collect())
	}

	/// Segments a word and yields its `(key, successor)` transitions.
	pub fn transitions(&self, word: &str) -> Result<impl Iterator<Item = (String, Successor)>> {
		Ok(self.segment(word)?.into_iter().map(Triplet::into_transition))
	}

	/// Cuts the marker-padded word into maximal same-class runs.
	fn runs(&self, word: &str) -> Vec<String> {
		let marker = self.alphabet.marker();
		let mut runs: Vec<String> = Vec::new();
		let mut current = String::new();
		let mut current_is_vowel = true;

		for c in std::iter::once(marker).chain(word.chars()).chain(std::iter::once(marker)) {
			let is_vowel = self.alphabet.is_vowel(c);
			if is_vowel != current_is_vowel && !current.is_empty() {
				runs.push(std::mem::take(&mut current));
			}
			current_is_vowel = is_vowel;
			current.push(c);
		}
		runs.push(current);

		runs
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn english() -> Segmenter {
		Segmenter::new(Alphabet::english())
	}

	fn triplet(leading: &str, middle: &str, trailing: &str) -> Triplet {
		Triplet {
			leading: leading.to_owned(),
			middle: middle.to_owned(),
			trailing: trailing.to_owned(),
		}
	}

	/// Rebuilds the padded word from its triplets.
	fn reassemble(triplets: &[Triplet]) -> String {
		let mut word = triplets[0].leading.clone();
		for t in triplets {
			word.push_str(&t.middle);
			word.push_str(&t.trailing);
		}
		word
	}

	#[test]
	fn test_segment_consonant_start() {
		assert_eq!(
			english().segment("hello").unwrap(),
			vec![triplet("~", "h", "e"), triplet("e", "ll", "o~")]
		);
	}

	#[test]
	fn test_segment_vowel_start() {
		assert_eq!(
			english().segment("apple").unwrap(),
			vec![triplet("~a", "ppl", "e~")]
		);
	}

	#[test]
	fn test_segment_consonant_end() {
		assert_eq!(
			english().segment("strength").unwrap(),
			vec![triplet("~", "str", "e"), triplet("e", "ngth", "~")]
		);
	}

	#[test]
	fn test_segment_all_vowels() {
		let segmenter = Segmenter::new(Alphabet::new("a".chars(), '~').unwrap());
		assert_eq!(segmenter.segment("aa").unwrap(), vec![triplet("~", "", "aa~")]);
	}

	#[test]
	fn test_segment_empty_word() {
		assert!(english().segment("").unwrap().is_empty());
	}

	#[test]
	fn test_segment_rejects_marker() {
		assert!(matches!(english().segment("a~b"), Err(Error::Configuration(_))));
	}

	#[test]
	fn test_segment_round_trip() {
		let segmenter = english();
		for word in ["hello", "apple", "strength", "queueing", "rhythm", "a", "b", "öffnen", "o'clock"] {
			let triplets = segmenter.segment(word).unwrap();
			assert!(!triplets.is_empty(), "{word}");
			let padded = reassemble(&triplets);
			assert_eq!(padded.trim_matches('~'), word);
			assert_eq!(padded, format!("~{word}~"));
		}
	}

	#[test]
	fn test_triplets_overlap() {
		let triplets = english().segment("banana").unwrap();
		for pair in triplets.windows(2) {
			assert_eq!(pair[0].trailing, pair[1].leading);
		}
	}

	#[test]
	fn test_transitions() {
		let transitions: Vec<_> = english().transitions("cat").unwrap().collect();
		assert_eq!(
			transitions,
			vec![
				("~".to_owned(), Successor::new("c".to_owned(), "a".to_owned())),
				("a".to_owned(), Successor::new("t".to_owned(), "~".to_owned())),
			]
		);
	}
}
