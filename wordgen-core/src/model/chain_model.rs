use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::builder::Accumulator;
use super::candidates::Candidates;
use crate::error::{Error, Result};

/// An edge of the chain: the consonant run that follows a key and the vowel
/// run reached after it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Successor {
	pub middle: String,
	pub next: String,
}

impl Successor {
	pub fn new(middle: String, next: String) -> Self {
		Self { middle, next }
	}
}

/// A frozen segment chain: start table, transition table and weighted flag.
///
/// This is the unit of training output, persistence and generation input.
/// It is never mutated in place; seeding and merging build a new one through
/// an [`Accumulator`].
///
/// # Invariants
/// - Every candidate collection matches `weighted` and is non-empty
/// - `starts` is empty if and only if `transitions` is empty
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChainModel {
	weighted: bool,
	starts: Candidates<String>,
	transitions: BTreeMap<String, Candidates<Successor>>,
}

impl ChainModel {
	/// Returns an unseeded model.
	pub fn empty(weighted: bool) -> Self {
		Self {
			weighted,
			starts: Candidates::empty(weighted),
			transitions: BTreeMap::new(),
		}
	}

	/// Assembles a model from its tables, checking the shape invariants.
	///
	/// # Errors
	/// Returns a format error if a collection disagrees with `weighted`, is
	/// empty, repeats an item, carries a zero count or has counts whose sum
	/// does not fit in a `u64`.
	pub fn from_parts(
		weighted: bool,
		starts: Candidates<String>,
		transitions: BTreeMap<String, Candidates<Successor>>,
	) -> Result<Self> {
		let model = Self { weighted, starts, transitions };
		model.check_shape()?;
		Ok(model)
	}

	/// Assembles a model the caller knows to be well formed.
	pub(super) fn assemble(
		weighted: bool,
		starts: Candidates<String>,
		transitions: BTreeMap<String, Candidates<Successor>>,
	) -> Self {
		Self { weighted, starts, transitions }
	}

	pub fn is_weighted(&self) -> bool {
		self.weighted
	}

	/// `true` until the model has been seeded or loaded.
	pub fn is_empty(&self) -> bool {
		self.starts.is_empty() || self.transitions.is_empty()
	}

	pub fn starts(&self) -> &Candidates<String> {
		&self.starts
	}

	pub fn transitions(&self) -> &BTreeMap<String, Candidates<Successor>> {
		&self.transitions
	}

	/// Returns the outgoing choices of `key`, if it is a chain state.
	pub fn successors(&self, key: &str) -> Option<&Candidates<Successor>> {
		self.transitions.get(key)
	}

	/// Merges another model into this one.
	///
	/// Counts are summed (weighted) or sets unioned (unweighted).
	///
	/// # Errors
	/// Returns a configuration error if the weighted flags differ or if a
	/// summed count would overflow. `self` is left untouched on error.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.weighted != other.weighted {
			return Err(Error::Configuration(format!(
				"Weighted mismatch: self={}, other={}",
				self.weighted, other.weighted
			)));
		}

		let mut accumulator = Accumulator::from_model(self);
		accumulator.merge(Accumulator::from_model(other))?;
		*self = accumulator.freeze(self.weighted);
		Ok(())
	}

	/// Checks that collections agree with the weighted flag and hold valid,
	/// distinct entries.
	pub(crate) fn check_shape(&self) -> Result<()> {
		if self.starts.is_empty() != self.transitions.is_empty() {
			return Err(Error::Format(
				"Start table and components must be both empty or both populated".to_owned(),
			));
		}

		Self::check_candidates("starts", &self.starts, self.weighted)?;
		for (key, successors) in &self.transitions {
			if key.is_empty() {
				return Err(Error::Format("Empty component key".to_owned()));
			}
			Self::check_candidates(key, successors, self.weighted)?;
			if successors.is_empty() {
				return Err(Error::Format(format!("Component {:?} has no entries", key)));
			}
		}

		Ok(())
	}

	fn check_candidates<T: Ord + std::fmt::Debug>(
		name: &str,
		candidates: &Candidates<T>,
		weighted: bool,
	) -> Result<()> {
		if candidates.is_weighted() != weighted {
			return Err(Error::Format(format!(
				"{:?} does not match weighted={}",
				name, weighted
			)));
		}

		let mut seen = BTreeSet::new();
		let mut total = 0u64;
		for (item, count) in candidates.iter() {
			if count == 0 {
				return Err(Error::Format(format!("{:?}: zero count for {:?}", name, item)));
			}
			total = total
				.checked_add(count)
				.ok_or_else(|| Error::Format(format!("{:?}: counts overflow", name)))?;
			if !seen.insert(item) {
				return Err(Error::Format(format!("{:?}: duplicate entry {:?}", name, item)));
			}
		}

		Ok(())
	}

	/// Checks that every walk through the chain can terminate on `marker`.
	///
	/// Every start must be a chain state, every successor must either end a
	/// word or lead to another chain state, and every state reachable from a
	/// start must have some path to the end of a word.
	pub(crate) fn check_closure(&self, marker: char) -> Result<()> {
		for start in self.starts.items() {
			if !start.starts_with(marker) {
				return Err(Error::Format(format!("Start {:?} does not begin with {:?}", start, marker)));
			}
			if !self.transitions.contains_key(start) {
				return Err(Error::Format(format!("Start {:?} has no component", start)));
			}
		}

		for (key, successors) in &self.transitions {
			for successor in successors.items() {
				if successor.next.is_empty() {
					return Err(Error::Format(format!("Component {:?} has an empty next segment", key)));
				}
				if !successor.next.ends_with(marker) && !self.transitions.contains_key(&successor.next) {
					return Err(Error::Format(format!(
						"Component {:?} leads to unknown segment {:?}",
						key, successor.next
					)));
				}
			}
		}

		let finishing = self.finishing_states(marker);
		let mut pending: Vec<&str> = self.starts.items().map(String::as_str).collect();
		let mut visited = BTreeSet::new();
		while let Some(key) = pending.pop() {
			if !visited.insert(key) {
				continue;
			}
			if !finishing.contains(key) {
				return Err(Error::Format(format!("Segment {:?} can never reach the end of a word", key)));
			}
			let Some(successors) = self.transitions.get(key) else {
				continue;
			};
			for successor in successors.items() {
				if !successor.next.ends_with(marker) {
					pending.push(&successor.next);
				}
			}
		}

		Ok(())
	}

	/// Returns the states from which at least one path ends a word.
	fn finishing_states(&self, marker: char) -> BTreeSet<&str> {
		let mut finishing = BTreeSet::new();
		loop {
			let before = finishing.len();
			for (key, successors) in &self.transitions {
				if finishing.contains(key.as_str()) {
					continue;
				}
				let ends = successors
					.items()
					.any(|s| s.next.ends_with(marker) || finishing.contains(s.next.as_str()));
				if ends {
					finishing.insert(key.as_str());
				}
			}
			if finishing.len() == before {
				return finishing;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn successor(middle: &str, next: &str) -> Successor {
		Successor::new(middle.to_owned(), next.to_owned())
	}

	fn weighted_cat() -> ChainModel {
		ChainModel::from_parts(
			true,
			Candidates::Weighted(vec![("~".to_owned(), 1)]),
			BTreeMap::from([
				("~".to_owned(), Candidates::Weighted(vec![(successor("c", "a"), 1)])),
				("a".to_owned(), Candidates::Weighted(vec![(successor("t", "~"), 1)])),
			]),
		)
		.unwrap()
	}

	#[test]
	fn test_empty_model() {
		let model = ChainModel::empty(true);
		assert!(model.is_empty());
		assert!(model.is_weighted());
		assert!(model.check_shape().is_ok());
	}

	#[test]
	fn test_flag_mismatch_is_rejected() {
		let result = ChainModel::from_parts(
			false,
			Candidates::Weighted(vec![("~".to_owned(), 1)]),
			BTreeMap::from([("~".to_owned(), Candidates::Uniform(vec![successor("b", "~")]))]),
		);
		assert!(matches!(result, Err(Error::Format(_))));
	}

	#[test]
	fn test_zero_count_is_rejected() {
		let result = ChainModel::from_parts(
			true,
			Candidates::Weighted(vec![("~".to_owned(), 0)]),
			BTreeMap::from([("~".to_owned(), Candidates::Weighted(vec![(successor("b", "~"), 1)]))]),
		);
		assert!(matches!(result, Err(Error::Format(_))));
	}

	#[test]
	fn test_duplicates_are_rejected() {
		let result = ChainModel::from_parts(
			false,
			Candidates::Uniform(vec!["~".to_owned()]),
			BTreeMap::from([(
				"~".to_owned(),
				Candidates::Uniform(vec![successor("b", "~"), successor("b", "~")]),
			)]),
		);
		assert!(matches!(result, Err(Error::Format(_))));
	}

	#[test]
	fn test_empty_component_is_rejected() {
		let result = ChainModel::from_parts(
			false,
			Candidates::Uniform(vec!["~".to_owned()]),
			BTreeMap::from([("~".to_owned(), Candidates::Uniform(vec![]))]),
		);
		assert!(matches!(result, Err(Error::Format(_))));
	}

	#[test]
	fn test_closure() {
		assert!(weighted_cat().check_closure('~').is_ok());

		let dangling = ChainModel::from_parts(
			true,
			Candidates::Weighted(vec![("~".to_owned(), 1)]),
			BTreeMap::from([("~".to_owned(), Candidates::Weighted(vec![(successor("c", "a"), 1)]))]),
		)
		.unwrap();
		assert!(matches!(dangling.check_closure('~'), Err(Error::Format(_))));
	}

	#[test]
	fn test_closure_rejects_endless_cycle() {
		// "a" only ever leads back to itself
		let endless = ChainModel::from_parts(
			true,
			Candidates::Weighted(vec![("~".to_owned(), 1)]),
			BTreeMap::from([
				("~".to_owned(), Candidates::Weighted(vec![(successor("b", "a"), 1)])),
				("a".to_owned(), Candidates::Weighted(vec![(successor("b", "a"), 1)])),
			]),
		)
		.unwrap();
		assert!(matches!(endless.check_closure('~'), Err(Error::Format(_))));

		// A cycle with an exit is fine
		let looping = ChainModel::from_parts(
			true,
			Candidates::Weighted(vec![("~".to_owned(), 1)]),
			BTreeMap::from([
				("~".to_owned(), Candidates::Weighted(vec![(successor("b", "a"), 1)])),
				(
					"a".to_owned(),
					Candidates::Weighted(vec![(successor("b", "a"), 3), (successor("t", "~"), 1)]),
				),
			]),
		)
		.unwrap();
		assert!(looping.check_closure('~').is_ok());
	}

	#[test]
	fn test_closure_rejects_trap_behind_exit() {
		// "o" is reachable from "a" but never finishes a word
		let trapped = ChainModel::from_parts(
			false,
			Candidates::Uniform(vec!["~".to_owned()]),
			BTreeMap::from([
				("~".to_owned(), Candidates::Uniform(vec![successor("c", "a")])),
				("a".to_owned(), Candidates::Uniform(vec![successor("t", "~"), successor("p", "o")])),
				("o".to_owned(), Candidates::Uniform(vec![successor("p", "o")])),
			]),
		)
		.unwrap();
		assert!(matches!(trapped.check_closure('~'), Err(Error::Format(_))));
	}

	#[test]
	fn test_overflowing_counts_are_rejected() {
		let result = ChainModel::from_parts(
			true,
			Candidates::Weighted(vec![("~".to_owned(), 1)]),
			BTreeMap::from([(
				"~".to_owned(),
				Candidates::Weighted(vec![(successor("b", "~"), u64::MAX), (successor("c", "~"), 1)]),
			)]),
		);
		assert!(matches!(result, Err(Error::Format(_))));
	}

	#[test]
	fn test_merge_overflow_keeps_model() {
		let big = ChainModel::from_parts(
			true,
			Candidates::Weighted(vec![("~".to_owned(), u64::MAX)]),
			BTreeMap::from([("~".to_owned(), Candidates::Weighted(vec![(successor("b", "~"), 1)]))]),
		)
		.unwrap();
		let mut model = big.clone();
		assert!(matches!(model.merge(&big), Err(Error::Configuration(_))));
		assert_eq!(model, big);
	}

	#[test]
	fn test_merge_sums_counts() {
		let mut model = weighted_cat();
		model.merge(&weighted_cat()).unwrap();
		assert_eq!(model.starts(), &Candidates::Weighted(vec![("~".to_owned(), 2)]));
		assert_eq!(
			model.successors("a"),
			Some(&Candidates::Weighted(vec![(successor("t", "~"), 2)]))
		);
	}

	#[test]
	fn test_merge_rejects_mixed_flags() {
		let mut model = weighted_cat();
		assert!(matches!(model.merge(&ChainModel::empty(false)), Err(Error::Configuration(_))));
	}
}
