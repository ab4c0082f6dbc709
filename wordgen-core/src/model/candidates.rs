use rand::Rng;
use serde::{Deserialize, Serialize};

/// The outgoing choices of one chain state.
///
/// A model is either weighted or unweighted for its whole lifetime, so every
/// collection in it uses the same variant:
/// - `Weighted`: items with their observed counts, sampled proportionally
/// - `Uniform`: distinct items, sampled uniformly
///
/// Items are kept in a stable order so that a seeded random source always
/// reproduces the same walk.
///
/// ## Invariants
/// - The collection is never empty once part of a model
/// - Each count is strictly positive
/// - Items are distinct
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum Candidates<T> {
	Weighted(Vec<(T, u64)>),
	Uniform(Vec<T>),
}

impl<T> Candidates<T> {
	/// Returns an empty collection of the requested flavour.
	pub fn empty(weighted: bool) -> Self {
		if weighted {
			Self::Weighted(Vec::new())
		} else {
			Self::Uniform(Vec::new())
		}
	}

	pub fn is_weighted(&self) -> bool {
		matches!(self, Self::Weighted(_))
	}

	pub fn len(&self) -> usize {
		match self {
			Self::Weighted(items) => items.len(),
			Self::Uniform(items) => items.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Iterates over `(item, count)`; uniform items count as 1.
	pub fn iter(&self) -> Box<dyn Iterator<Item = (&T, u64)> + '_> {
		match self {
			Self::Weighted(items) => Box::new(items.iter().map(|(item, count)| (item, *count))),
			Self::Uniform(items) => Box::new(items.iter().map(|item| (item, 1))),
		}
	}

	/// Iterates over the items alone.
	pub fn items(&self) -> impl Iterator<Item = &T> {
		self.iter().map(|(item, _)| item)
	}

	/// Sum of all counts (the number of items when uniform).
	pub fn total(&self) -> u64 {
		match self {
			Self::Weighted(items) => items.iter().map(|(_, count)| count).sum(),
			Self::Uniform(items) => items.len() as u64,
		}
	}

	/// Picks a candidate with the collection's sampling policy.
	///
	/// Weighted collections draw a real number in `[0, total)` and hand it to
	/// [`Candidates::select`]; uniform collections pick an index uniformly.
	///
	/// Returns `None` if the collection is empty.
	pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&T> {
		match self {
			Self::Weighted(items) => {
				let total = self.total();
				if total == 0 {
					return None;
				}
				let draw = rng.random_range(0.0..total as f64);
				select(items, draw)
			}
			Self::Uniform(items) => {
				if items.is_empty() {
					return None;
				}
				items.get(rng.random_range(0..items.len()))
			}
		}
	}
}

/// Weighted selection for a fixed draw.
///
/// Walks `items` in order with a running sum of the counts and returns the
/// first item whose running sum exceeds `draw`. Draws at or past the total
/// fall back to the last item.
pub fn select<T>(items: &[(T, u64)], draw: f64) -> Option<&T> {
	let mut running = 0u64;
	for (item, count) in items {
		running += count;
		if running as f64 > draw {
			return Some(item);
		}
	}

	// Only reachable through float rounding at the very top of the range
	items.last().map(|(item, _)| item)
}
