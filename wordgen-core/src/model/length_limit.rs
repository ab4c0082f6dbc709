use crate::error::{Error, Result};

/// Length window applied to generated words.
///
/// A word of `len` characters is accepted when `minimum < len < maximum`.
///
/// The minimum is absolute: shorter words are always discarded. The maximum
/// is a rough stopping point: walks are never cut short, words that run past
/// it are simply thrown away and generation tries again.
///
/// # Invariants
/// - If a maximum is set, the window holds at least one length
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct LengthLimit {
	minimum: usize,
	maximum: Option<usize>,
}

impl LengthLimit {
	/// Accepts any non-empty word.
	pub fn unbounded() -> Self {
		Self::default()
	}

	/// Accepts words shorter than `maximum`.
	///
	/// # Errors
	/// Returns an error if no length fits (`maximum < 2`).
	pub fn maximum(maximum: usize) -> Result<Self> {
		Self::range(0, maximum)
	}

	/// Accepts words longer than `minimum` and shorter than `maximum`.
	///
	/// # Errors
	/// Returns an error if no length fits between the two bounds.
	pub fn range(minimum: usize, maximum: usize) -> Result<Self> {
		if maximum <= minimum.saturating_add(1) {
			return Err(Error::Configuration(format!(
				"No word length fits between minimum {} and maximum {}",
				minimum, maximum
			)));
		}
		Ok(Self { minimum, maximum: Some(maximum) })
	}

	/// Accepts words longer than `minimum`, with no maximum.
	pub fn at_least(minimum: usize) -> Self {
		Self { minimum, maximum: None }
	}

	pub fn min_len(&self) -> usize {
		self.minimum
	}

	pub fn max_len(&self) -> Option<usize> {
		self.maximum
	}

	/// Returns `true` if a word of `len` characters falls in the window.
	pub fn accepts(&self, len: usize) -> bool {
		len > self.minimum && self.maximum.is_none_or(|maximum| len < maximum)
	}
}
