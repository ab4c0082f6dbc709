use std::collections::BTreeMap;
use std::sync::mpsc;
use std::thread;

use log::{debug, info};

use super::alphabet::Alphabet;
use super::candidates::Candidates;
use super::chain_model::{ChainModel, Successor};
use super::segmenter::Segmenter;
use crate::error::{Error, Result};

/// Mutable transition counts collected while learning.
///
/// Keys are kept sorted so that freezing the same counts always produces the
/// same candidate order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Accumulator {
	starts: BTreeMap<String, u64>,
	transitions: BTreeMap<String, BTreeMap<Successor, u64>>,
}

impl Accumulator {
	pub fn new() -> Self {
		Self::default()
	}

	/// Thaws a frozen model back into counts.
	///
	/// Uniform entries count as one observation each.
	pub fn from_model(model: &ChainModel) -> Self {
		let starts = model
			.starts()
			.iter()
			.map(|(key, count)| (key.clone(), count))
			.collect();
		let transitions = model
			.transitions()
			.iter()
			.map(|(key, successors)| {
				let counts = successors
					.iter()
					.map(|(successor, count)| (successor.clone(), count))
					.collect();
				(key.clone(), counts)
			})
			.collect();

		Self { starts, transitions }
	}

	pub fn is_empty(&self) -> bool {
		self.transitions.is_empty()
	}

	/// Records one observed transition.
	///
	/// A key beginning with `marker` opened a word and is also counted as a
	/// start.
	///
	/// # Errors
	/// Returns a configuration error if a count would overflow.
	pub fn record(&mut self, key: String, successor: Successor, marker: char) -> Result<()> {
		if key.starts_with(marker) {
			Self::bump(self.starts.entry(key.clone()).or_insert(0), 1)?;
		}
		let counts = self.transitions.entry(key).or_default();
		Self::bump(counts.entry(successor).or_insert(0), 1)
	}

	/// Adds all counts of `other` to this accumulator.
	///
	/// # Errors
	/// Returns a configuration error if a summed count would overflow. The
	/// accumulator may then hold a partial merge.
	pub fn merge(&mut self, other: Self) -> Result<()> {
		for (key, count) in other.starts {
			Self::bump(self.starts.entry(key).or_insert(0), count)?;
		}
		for (key, successors) in other.transitions {
			let existing = self.transitions.entry(key).or_default();
			for (successor, count) in successors {
				Self::bump(existing.entry(successor).or_insert(0), count)?;
			}
		}
		Ok(())
	}

	fn bump(slot: &mut u64, count: u64) -> Result<()> {
		*slot = slot
			.checked_add(count)
			.ok_or_else(|| Error::Configuration("Transition count overflow".to_owned()))?;
		Ok(())
	}

	/// Freezes the counts into an immutable model.
	///
	/// When `weighted` is false the counts are dropped and only the distinct
	/// entries are kept.
	pub fn freeze(self, weighted: bool) -> ChainModel {
		let starts = Self::collapse(self.starts, weighted);
		let transitions = self
			.transitions
			.into_iter()
			.map(|(key, successors)| (key, Self::collapse(successors, weighted)))
			.collect();

		ChainModel::assemble(weighted, starts, transitions)
	}

	fn collapse<T>(counts: BTreeMap<T, u64>, weighted: bool) -> Candidates<T> {
		if weighted {
			Candidates::Weighted(counts.into_iter().collect())
		} else {
			Candidates::Uniform(counts.into_keys().collect())
		}
	}
}

/// Builds a [`ChainModel`] from a vocabulary.
///
/// # Responsibilities
/// - Normalize input words (trim, lower-case, skip empty lines)
/// - Segment each word and accumulate its transitions
/// - Optionally start from an existing model to append a new vocabulary
/// - Spread large vocabularies over worker threads and merge the results
pub struct ChainBuilder {
	segmenter: Segmenter,
	weighted: bool,
	accumulator: Accumulator,
	words: usize,
}

impl ChainBuilder {
	/// Creates a builder for a fresh model.
	pub fn new(alphabet: Alphabet, weighted: bool) -> Self {
		Self {
			segmenter: Segmenter::new(alphabet),
			weighted,
			accumulator: Accumulator::new(),
			words: 0,
		}
	}

	/// Creates a builder that extends `model`.
	///
	/// The result keeps the weighted flag of `model`.
	pub fn appending(alphabet: Alphabet, model: &ChainModel) -> Self {
		Self {
			segmenter: Segmenter::new(alphabet),
			weighted: model.is_weighted(),
			accumulator: Accumulator::from_model(model),
			words: 0,
		}
	}

	/// Number of (non-empty) words learned by this builder.
	pub fn word_count(&self) -> usize {
		self.words
	}

	/// Learns a single word.
	///
	/// # Notes
	/// - Surrounding whitespace is removed and the word is lower-cased.
	/// - Empty words are ignored.
	///
	/// # Errors
	/// Returns a configuration error if the word contains the boundary marker.
	pub fn add_word(&mut self, raw: &str) -> Result<()> {
		let word = raw.trim().to_lowercase();
		if word.is_empty() {
			return Ok(());
		}

		let marker = self.segmenter.alphabet().marker();
		for (key, successor) in self.segmenter.transitions(&word)? {
			self.accumulator.record(key, successor, marker)?;
		}
		self.words += 1;
		Ok(())
	}

	/// Learns every word of an iterator, in order.
	pub fn add_words<I, S>(&mut self, words: I) -> Result<()>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		for word in words {
			self.add_word(word.as_ref())?;
		}
		Ok(())
	}

	/// Learns a word list using one worker thread per chunk.
	///
	/// # Behavior
	/// - Splits the list into `cpus * 8` chunks.
	/// - Each thread fills its own accumulator.
	/// - Partial accumulators are merged as they arrive.
	///
	/// The resulting counts are the same as with [`ChainBuilder::add_words`].
	pub fn add_words_parallel(&mut self, words: &[String]) -> Result<()> {
		if words.is_empty() {
			return Ok(());
		}

		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = words.len().div_ceil(chunks);
		info!("Learning {} words in chunks of {} on {} cpus", words.len(), chunk_size, cpus);

		let (tx, rx) = mpsc::channel();
		for chunk in words.chunks(chunk_size) {
			let tx = tx.clone();
			let chunk: Vec<String> = chunk.to_vec();
			let segmenter = self.segmenter.clone();
			let weighted = self.weighted;

			thread::spawn(move || {
				let mut partial = ChainBuilder {
					segmenter,
					weighted,
					accumulator: Accumulator::new(),
					words: 0,
				};
				let result = partial.add_words(&chunk).map(|_| (partial.accumulator, partial.words));
				// The receiver is gone only if another chunk already failed
				let _ = tx.send(result);
			});
		}
		drop(tx);

		for result in rx.iter() {
			let (accumulator, words) = result?;
			self.accumulator.merge(accumulator)?;
			self.words += words;
		}

		Ok(())
	}

	/// Freezes the accumulated counts into a model.
	pub fn build(self) -> ChainModel {
		debug!(
			"Built chain from {} words: {} states, {} starts",
			self.words,
			self.accumulator.transitions.len(),
			self.accumulator.starts.len()
		);
		self.accumulator.freeze(self.weighted)
	}
}
