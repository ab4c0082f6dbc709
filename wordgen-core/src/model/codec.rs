use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use super::candidates::Candidates;
use super::chain_model::{ChainModel, Successor};
use crate::error::{Error, Result};

/// Persisted representations of a [`ChainModel`].
///
/// - `Json`: the stable, human-readable document
/// - `Binary`: a compact `postcard` encoding, used as a cache next to
///   dictionaries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ModelFormat {
	#[default]
	Json,
	Binary,
}

impl ModelFormat {
	/// Guesses the format from a file extension (`.bin` is binary, anything
	/// else is JSON).
	pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
		match path.as_ref().extension().and_then(|e| e.to_str()) {
			Some("bin") => Self::Binary,
			_ => Self::Json,
		}
	}

	pub fn extension(&self) -> &'static str {
		match self {
			Self::Json => "json",
			Self::Binary => "bin",
		}
	}
}

/// The JSON document.
///
/// ```text
/// { "weighted": true,
///   "starts": { "~": 3, "~a": 1 },
///   "components": { "~": [[["c", "a"], 2], [["c", "o"], 1]] } }
///
/// { "weighted": false,
///   "starts": ["~", "~a"],
///   "components": { "~": [[["c", "a"]], [["c", "o"]]] } }
/// ```
#[derive(Serialize, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct Document {
	weighted: bool,
	starts: StartsField,
	components: UniqueMap<Vec<EntryField>>,
}

/// A JSON object that rejects repeated keys instead of keeping the last one.
#[derive(Serialize, Debug)]
#[serde(transparent)]
struct UniqueMap<V>(BTreeMap<String, V>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for UniqueMap<V> {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
		struct UniqueMapVisitor<V>(PhantomData<V>);

		impl<'de, V: Deserialize<'de>> Visitor<'de> for UniqueMapVisitor<V> {
			type Value = UniqueMap<V>;

			fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
				formatter.write_str("an object with distinct keys")
			}

			fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
				let mut map = BTreeMap::new();
				while let Some((key, value)) = access.next_entry::<String, V>()? {
					match map.entry(key) {
						Entry::Occupied(entry) => {
							return Err(de::Error::custom(format!("duplicate key {:?}", entry.key())));
						}
						Entry::Vacant(entry) => {
							entry.insert(value);
						}
					}
				}
				Ok(UniqueMap(map))
			}
		}

		deserializer.deserialize_map(UniqueMapVisitor(PhantomData))
	}
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(untagged)]
enum StartsField {
	Counted(UniqueMap<u64>),
	Listed(Vec<String>),
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(untagged)]
enum EntryField {
	Counted((String, String), u64),
	Bare(((String, String),)),
}

impl Document {
	fn from_model(model: &ChainModel) -> Self {
		let starts = match model.starts() {
			Candidates::Weighted(items) => StartsField::Counted(UniqueMap(items.iter().cloned().collect())),
			Candidates::Uniform(items) => StartsField::Listed(items.clone()),
		};

		let components = model
			.transitions()
			.iter()
			.map(|(key, successors)| {
				let entries: Vec<EntryField> = match successors {
					Candidates::Weighted(items) => items
						.iter()
						.map(|(s, count)| EntryField::Counted((s.middle.clone(), s.next.clone()), *count))
						.collect(),
					Candidates::Uniform(items) => items
						.iter()
						.map(|s| EntryField::Bare(((s.middle.clone(), s.next.clone()),)))
						.collect(),
				};
				(key.clone(), entries)
			})
			.collect();

		Self {
			weighted: model.is_weighted(),
			starts,
			components: UniqueMap(components),
		}
	}

	fn into_model(self) -> Result<ChainModel> {
		let weighted = self.weighted;

		let starts = match (weighted, self.starts) {
			(true, StartsField::Counted(counts)) => Candidates::Weighted(counts.0.into_iter().collect()),
			(false, StartsField::Listed(keys)) => Candidates::Uniform(keys),
			(_, StartsField::Counted(counts)) if counts.0.is_empty() => Candidates::empty(weighted),
			(_, StartsField::Listed(keys)) if keys.is_empty() => Candidates::empty(weighted),
			_ => {
				return Err(Error::Format(format!(
					"\"starts\" does not match weighted={}",
					weighted
				)));
			}
		};

		let mut transitions = BTreeMap::new();
		for (key, entries) in self.components.0 {
			let successors = if weighted {
				let items = entries
					.into_iter()
					.map(|entry| match entry {
						EntryField::Counted((middle, next), count) => Ok((Successor::new(middle, next), count)),
						EntryField::Bare(_) => Err(Error::Format(format!("Component {:?}: missing count", key))),
					})
					.collect::<Result<Vec<_>>>()?;
				Candidates::Weighted(items)
			} else {
				let items = entries
					.into_iter()
					.map(|entry| match entry {
						EntryField::Bare(((middle, next),)) => Ok(Successor::new(middle, next)),
						EntryField::Counted(..) => Err(Error::Format(format!(
							"Component {:?}: count in an unweighted model",
							key
						))),
					})
					.collect::<Result<Vec<_>>>()?;
				Candidates::Uniform(items)
			};
			transitions.insert(key, successors);
		}

		ChainModel::from_parts(weighted, starts, transitions)
	}
}

/// Serializes a model.
pub fn encode(model: &ChainModel, format: ModelFormat) -> Result<Vec<u8>> {
	match format {
		ModelFormat::Json => Ok(serde_json::to_vec(&Document::from_model(model))?),
		ModelFormat::Binary => Ok(postcard::to_stdvec(model)?),
	}
}

/// Deserializes a model.
///
/// Decoding is all or nothing: any malformed, truncated or inconsistent
/// input is reported as [`Error::Format`] and no model is produced.
pub fn decode(bytes: &[u8], format: ModelFormat) -> Result<ChainModel> {
	match format {
		ModelFormat::Json => {
			let document: Document = serde_json::from_slice(bytes)?;
			document.into_model()
		}
		ModelFormat::Binary => {
			let (model, rest): (ChainModel, &[u8]) = postcard::take_from_bytes(bytes)?;
			if !rest.is_empty() {
				return Err(Error::Format(format!("{} trailing bytes", rest.len())));
			}
			model.check_shape()?;
			Ok(model)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::alphabet::Alphabet;
	use crate::model::builder::ChainBuilder;
	use serde_json::json;

	const WORDS: [&str; 6] = ["hello", "world", "apple", "strength", "aa", "banana"];

	fn model(weighted: bool) -> ChainModel {
		let mut builder = ChainBuilder::new(Alphabet::english(), weighted);
		builder.add_words(WORDS).unwrap();
		builder.build()
	}

	fn decode_json(value: serde_json::Value) -> Result<ChainModel> {
		decode(&serde_json::to_vec(&value).unwrap(), ModelFormat::Json)
	}

	#[test]
	fn test_round_trip() {
		for weighted in [true, false] {
			for format in [ModelFormat::Json, ModelFormat::Binary] {
				let model = model(weighted);
				let bytes = encode(&model, format).unwrap();
				assert_eq!(decode(&bytes, format).unwrap(), model, "{weighted} {format:?}");
			}
		}
	}

	#[test]
	fn test_empty_round_trip() {
		let empty = ChainModel::empty(false);
		let bytes = encode(&empty, ModelFormat::Json).unwrap();
		assert_eq!(decode(&bytes, ModelFormat::Json).unwrap(), empty);
	}

	#[test]
	fn test_weighted_document_layout() {
		let mut builder = ChainBuilder::new(Alphabet::english(), true);
		builder.add_words(["cat", "cot", "cat"]).unwrap();
		let bytes = encode(&builder.build(), ModelFormat::Json).unwrap();
		let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

		assert_eq!(
			value,
			json!({
				"weighted": true,
				"starts": { "~": 3 },
				"components": {
					"~": [[["c", "a"], 2], [["c", "o"], 1]],
					"a": [[["t", "~"], 2]],
					"o": [[["t", "~"], 1]],
				}
			})
		);
	}

	#[test]
	fn test_unweighted_document_layout() {
		let mut builder = ChainBuilder::new(Alphabet::english(), false);
		builder.add_words(["cat", "cat"]).unwrap();
		let bytes = encode(&builder.build(), ModelFormat::Json).unwrap();
		let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

		assert_eq!(
			value,
			json!({
				"weighted": false,
				"starts": ["~"],
				"components": {
					"~": [[["c", "a"]]],
					"a": [[["t", "~"]]],
				}
			})
		);
	}

	#[test]
	fn test_truncated_json() {
		let bytes = encode(&model(true), ModelFormat::Json).unwrap();
		let truncated = &bytes[..bytes.len() / 2];
		assert!(matches!(decode(truncated, ModelFormat::Json), Err(Error::Format(_))));
	}

	#[test]
	fn test_missing_field() {
		let result = decode_json(json!({ "weighted": true, "starts": { "~": 1 } }));
		assert!(matches!(result, Err(Error::Format(_))));
	}

	#[test]
	fn test_unknown_field() {
		let result = decode_json(json!({
			"weighted": true,
			"starts": { "~": 1 },
			"components": { "~": [[["b", "~"], 1]] },
			"vowels": "aeiou",
		}));
		assert!(matches!(result, Err(Error::Format(_))));
	}

	#[test]
	fn test_count_in_unweighted_model() {
		let result = decode_json(json!({
			"weighted": false,
			"starts": ["~"],
			"components": { "~": [[["b", "~"], 1]] },
		}));
		assert!(matches!(result, Err(Error::Format(_))));
	}

	#[test]
	fn test_missing_count_in_weighted_model() {
		let result = decode_json(json!({
			"weighted": true,
			"starts": { "~": 1 },
			"components": { "~": [[["b", "~"]]] },
		}));
		assert!(matches!(result, Err(Error::Format(_))));
	}

	#[test]
	fn test_starts_shape_mismatch() {
		let result = decode_json(json!({
			"weighted": true,
			"starts": ["~"],
			"components": { "~": [[["b", "~"], 1]] },
		}));
		assert!(matches!(result, Err(Error::Format(_))));
	}

	#[test]
	fn test_zero_count() {
		let result = decode_json(json!({
			"weighted": true,
			"starts": { "~": 1 },
			"components": { "~": [[["b", "~"], 0]] },
		}));
		assert!(matches!(result, Err(Error::Format(_))));
	}

	#[test]
	fn test_empty_component() {
		let result = decode_json(json!({
			"weighted": true,
			"starts": { "~": 1 },
			"components": { "~": [] },
		}));
		assert!(matches!(result, Err(Error::Format(_))));
	}

	#[test]
	fn test_duplicate_start_key() {
		let json = br#"{"weighted": true, "starts": {"~": 1, "~": 5}, "components": {"~": [[["b", "~"], 1]]}}"#;
		assert!(matches!(decode(json, ModelFormat::Json), Err(Error::Format(_))));
	}

	#[test]
	fn test_duplicate_component_key() {
		let json = br#"{"weighted": false, "starts": ["~"], "components": {"~": [[["b", "~"]]], "~": [[["c", "~"]]]}}"#;
		assert!(matches!(decode(json, ModelFormat::Json), Err(Error::Format(_))));
	}

	#[test]
	fn test_overflowing_counts() {
		let result = decode_json(json!({
			"weighted": true,
			"starts": { "~": 1 },
			"components": { "~": [[["b", "~"], u64::MAX], [["c", "~"], 1]] },
		}));
		assert!(matches!(result, Err(Error::Format(_))));

		let result = decode_json(json!({
			"weighted": true,
			"starts": { "~": u64::MAX, "~a": 1 },
			"components": { "~": [[["b", "~"], 1]], "~a": [[["b", "~"], 1]] },
		}));
		assert!(matches!(result, Err(Error::Format(_))));
	}

	#[test]
	fn test_bad_binary() {
		let mut bytes = encode(&model(true), ModelFormat::Binary).unwrap();
		assert!(matches!(decode(&bytes[..bytes.len() - 3], ModelFormat::Binary), Err(Error::Format(_))));
		bytes.push(0);
		assert!(matches!(decode(&bytes, ModelFormat::Binary), Err(Error::Format(_))));
	}

	#[test]
	fn test_format_from_path() {
		assert_eq!(ModelFormat::from_path("data/english.bin"), ModelFormat::Binary);
		assert_eq!(ModelFormat::from_path("english.json"), ModelFormat::Json);
		assert_eq!(ModelFormat::from_path("-"), ModelFormat::Json);
	}
}
