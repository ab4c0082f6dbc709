use log::warn;
use rand::Rng;

use super::chain_model::ChainModel;
use super::length_limit::LengthLimit;
use crate::error::{Error, Result};

/// Random walks over a seeded [`ChainModel`].
///
/// A walk starts from a drawn start segment and keeps drawing
/// `(middle, next)` successors until the segment just appended ends with the
/// marker. The markers are then stripped from both ends.
#[derive(Clone, Copy, Debug)]
pub struct Sampler<'m> {
	model: &'m ChainModel,
	marker: char,
}

impl<'m> Sampler<'m> {
	/// Creates a sampler over `model`.
	///
	/// # Errors
	/// Returns [`Error::Unseeded`] if the model is empty. No random number is
	/// drawn before this check.
	pub fn new(model: &'m ChainModel, marker: char) -> Result<Self> {
		if model.is_empty() {
			return Err(Error::Unseeded);
		}
		Ok(Self { model, marker })
	}

	/// Performs one complete walk and returns the word it spelled.
	///
	/// There is no length check along the way; see [`LengthLimit`].
	pub fn walk<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
		let bare_marker = self.marker.to_string();

		let Some(start) = self.model.starts().choose(rng) else {
			return String::new();
		};
		let mut word = start.clone();
		let mut current: &str = start;

		loop {
			// A bare marker start has not produced anything yet
			if current.ends_with(self.marker) && word != bare_marker {
				break;
			}

			let Some(successor) = self.model.successors(current).and_then(|s| s.choose(rng)) else {
				warn!("Segment {:?} has no successors, ending word early", current);
				break;
			};
			word.push_str(&successor.middle);
			word.push_str(&successor.next);
			current = &successor.next;
		}

		word.trim_matches(self.marker).to_owned()
	}

	/// Returns a lazy sequence of words that fit `limit`.
	///
	/// The sequence is infinite when `count` is `None`, otherwise it stops
	/// after `count` accepted words.
	pub fn words<'r, R: Rng + ?Sized>(
		self,
		rng: &'r mut R,
		limit: LengthLimit,
		count: Option<usize>,
	) -> Words<'m, 'r, R> {
		Words {
			sampler: self,
			rng,
			limit,
			remaining: count,
			max_attempts: None,
		}
	}
}

/// Iterator over generated words, see [`Sampler::words`].
///
/// Each call to `next` walks the chain until a word falls inside the length
/// window. Rejected words are discarded.
pub struct Words<'m, 'r, R: ?Sized> {
	sampler: Sampler<'m>,
	rng: &'r mut R,
	limit: LengthLimit,
	remaining: Option<usize>,
	max_attempts: Option<usize>,
}

impl<R: Rng + ?Sized> Words<'_, '_, R> {
	/// Limits the number of walks spent on each word.
	///
	/// When a word cannot be found within `attempts` walks the sequence ends
	/// early instead of looping forever on an unreachable window.
	pub fn with_max_attempts(mut self, attempts: usize) -> Self {
		self.max_attempts = Some(attempts);
		self
	}
}

impl<R: Rng + ?Sized> Iterator for Words<'_, '_, R> {
	type Item = String;

	fn next(&mut self) -> Option<String> {
		if self.remaining == Some(0) {
			return None;
		}

		let mut attempts = 0usize;
		loop {
			if self.max_attempts.is_some_and(|max| attempts >= max) {
				self.remaining = Some(0);
				return None;
			}
			attempts += 1;

			let word = self.sampler.walk(&mut *self.rng);
			if self.limit.accepts(word.chars().count()) {
				if let Some(remaining) = self.remaining.as_mut() {
					*remaining -= 1;
				}
				return Some(word);
			}
		}
	}
}
