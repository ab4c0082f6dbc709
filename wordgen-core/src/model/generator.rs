use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::alphabet::Alphabet;
use super::builder::ChainBuilder;
use super::chain_model::ChainModel;
use super::codec::{self, ModelFormat};
use super::length_limit::LengthLimit;
use super::sampler::{Sampler, Words};
use crate::error::{Error, Result};
use crate::io;

/// Word lists at least this long are learned on worker threads.
pub const PARALLEL_THRESHOLD: usize = 10_000;

/// Where to learn words from, see [`WordGenerator::seed`].
///
/// Exactly one of `dictionary` and `language` must be set.
#[derive(Clone, Debug, Default)]
pub struct Seed {
	dictionary: Option<PathBuf>,
	language: Option<Vec<String>>,
	append: bool,
}

impl Seed {
	pub fn new() -> Self {
		Self::default()
	}

	/// A newline-delimited file of words.
	pub fn dictionary<P: Into<PathBuf>>(mut self, path: P) -> Self {
		self.dictionary = Some(path.into());
		self
	}

	/// An already split list of words.
	pub fn language<I, S>(mut self, words: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.language = Some(words.into_iter().map(Into::into).collect());
		self
	}

	/// Add to the current model instead of replacing it. This can be used to
	/// make amalgamation languages.
	pub fn append(mut self, append: bool) -> Self {
		self.append = append;
		self
	}
}

/// Payload of a dictionary's `.bin` cache.
///
/// The alphabet is stored with the model because the same dictionary
/// segments differently under another vowel set or marker.
#[derive(Serialize, Deserialize, Debug)]
struct Cache {
	vowels: Vec<char>,
	marker: char,
	model: ChainModel,
}

impl Cache {
	fn new(alphabet: &Alphabet, model: ChainModel) -> Self {
		Self {
			vowels: alphabet.vowels().collect(),
			marker: alphabet.marker(),
			model,
		}
	}

	fn read(path: &Path) -> Result<Self> {
		let bytes = fs::read(path).map_err(Error::resource(path))?;
		let (cache, rest): (Self, &[u8]) = postcard::take_from_bytes(&bytes)?;
		if !rest.is_empty() {
			return Err(Error::Format(format!("{} trailing bytes in {}", rest.len(), path.display())));
		}
		cache.model.check_shape()?;
		Ok(cache)
	}

	fn write(&self, path: &Path) -> Result<()> {
		let bytes = postcard::to_stdvec(self)?;
		fs::write(path, bytes).map_err(Error::resource(path))
	}

	fn matches(&self, alphabet: &Alphabet, weighted: bool) -> bool {
		self.marker == alphabet.marker()
			&& self.vowels.iter().copied().eq(alphabet.vowels())
			&& self.model.is_weighted() == weighted
	}
}

/// A generator for word-like strings that follow the feel of a language.
///
/// # Responsibilities
/// - Own the current [`ChainModel`] and the random source
/// - Seed (replace or append) the model from a vocabulary
/// - Load and save models, with a binary cache for dictionaries
/// - Generate words within a length window
#[derive(Debug)]
pub struct WordGenerator {
	alphabet: Alphabet,
	model: ChainModel,
	rng: StdRng,
}

impl WordGenerator {
	/// Creates an unseeded generator.
	///
	/// `weighted` controls whether common segments of the language are more
	/// likely to appear in the output. Weighted output is more realistic, but
	/// also often less interesting.
	pub fn new(alphabet: Alphabet, weighted: bool) -> Self {
		Self {
			alphabet,
			model: ChainModel::empty(weighted),
			rng: StdRng::from_os_rng(),
		}
	}

	/// Creates a generator around an existing model.
	///
	/// # Errors
	/// Returns a format error if some walk through `model` could not end on
	/// the alphabet's marker.
	pub fn from_model(alphabet: Alphabet, model: ChainModel) -> Result<Self> {
		model.check_closure(alphabet.marker())?;
		Ok(Self {
			alphabet,
			model,
			rng: StdRng::from_os_rng(),
		})
	}

	/// Replaces the random source with a seeded one, for reproducible output.
	pub fn with_rng_seed(mut self, seed: u64) -> Self {
		self.rng = StdRng::seed_from_u64(seed);
		self
	}

	/// Opens a dictionary through its binary cache.
	///
	/// # Behavior
	/// - If `<stem>.bin` exists next to the dictionary, is not older than it
	///   and was built with the same alphabet and weighting, the model is
	///   decoded from it.
	/// - Otherwise the dictionary is learned and the cache is (re)written.
	pub fn open<P: AsRef<Path>>(dictionary: P, alphabet: Alphabet, weighted: bool) -> Result<Self> {
		let dictionary = dictionary.as_ref();
		let cache_path = io::build_output_path(dictionary, ModelFormat::Binary.extension())
			.map_err(Error::resource(dictionary))?;

		if io::is_up_to_date(dictionary, &cache_path) {
			let cache = Cache::read(&cache_path)?;
			if cache.matches(&alphabet, weighted) {
				debug!("Loaded {} from cache {}", dictionary.display(), cache_path.display());
				return Self::from_model(alphabet, cache.model);
			}
			debug!("Cache {} has another alphabet or weighting, rebuilding", cache_path.display());
		}

		let mut generator = Self::new(alphabet, weighted);
		generator.seed(Seed::new().dictionary(dictionary))?;
		Cache::new(&generator.alphabet, generator.model.clone()).write(&cache_path)?;
		info!("Cached {} to {}", dictionary.display(), cache_path.display());

		Ok(generator)
	}

	pub fn alphabet(&self) -> &Alphabet {
		&self.alphabet
	}

	pub fn model(&self) -> &ChainModel {
		&self.model
	}

	pub fn is_weighted(&self) -> bool {
		self.model.is_weighted()
	}

	pub fn is_seeded(&self) -> bool {
		!self.model.is_empty()
	}

	/// Seeds the generator with a vocabulary.
	///
	/// Words are trimmed and lower-cased, empty lines are skipped. Without
	/// `append` the current model is replaced, with it counts are added to
	/// the current model. The model is only swapped once learning succeeded.
	///
	/// # Errors
	/// - Configuration error if both or neither source is given, or a word
	///   contains the marker
	/// - Resource error if the dictionary cannot be read
	pub fn seed(&mut self, seed: Seed) -> Result<()> {
		let words = match (seed.dictionary, seed.language) {
			(Some(path), None) => io::read_words(&path)?,
			(None, Some(words)) => words,
			_ => {
				return Err(Error::Configuration(
					"One, and only one of dictionary and language may be passed to seed the word generator"
						.to_owned(),
				));
			}
		};

		let mut builder = if seed.append {
			ChainBuilder::appending(self.alphabet.clone(), &self.model)
		} else {
			ChainBuilder::new(self.alphabet.clone(), self.model.is_weighted())
		};

		if words.len() >= PARALLEL_THRESHOLD {
			builder.add_words_parallel(&words)?;
		} else {
			builder.add_words(&words)?;
		}
		info!("Seeded generator with {} words (append: {})", builder.word_count(), seed.append);

		self.model = builder.build();
		Ok(())
	}

	/// Merges another model into the current one.
	///
	/// # Errors
	/// - Configuration error if the weighted flags differ
	/// - Format error if `other` is not closed over the alphabet's marker
	pub fn merge(&mut self, other: &ChainModel) -> Result<()> {
		other.check_closure(self.alphabet.marker())?;
		self.model.merge(other)
	}

	/// Loads a model, replacing the current one.
	///
	/// The generator takes the weighted flag of the loaded model. On error the
	/// current model is left untouched.
	pub fn load<R: Read>(&mut self, mut reader: R, format: ModelFormat) -> Result<()> {
		let mut bytes = Vec::new();
		reader.read_to_end(&mut bytes)?;
		let model = codec::decode(&bytes, format)?;
		model.check_closure(self.alphabet.marker())?;
		self.model = model;
		Ok(())
	}

	/// Loads a model from a file, choosing the format from its extension.
	pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
		let path = path.as_ref();
		let file = fs::File::open(path).map_err(Error::resource(path))?;
		self.load(file, ModelFormat::from_path(path))?;
		info!("Loaded model from {}", path.display());
		Ok(())
	}

	/// Saves the model, allowing quicker generation later on.
	pub fn save<W: Write>(&self, mut writer: W, format: ModelFormat) -> Result<()> {
		writer.write_all(&codec::encode(&self.model, format)?)?;
		writer.flush()?;
		Ok(())
	}

	/// Saves the model to a file, choosing the format from its extension.
	pub fn save_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let path = path.as_ref();
		let bytes = codec::encode(&self.model, ModelFormat::from_path(path))?;
		fs::write(path, bytes).map_err(Error::resource(path))?;
		info!("Saved model to {}", path.display());
		Ok(())
	}

	/// Generates a single word within `limit`.
	///
	/// # Errors
	/// Returns [`Error::Unseeded`] if the generator has no model.
	pub fn generate_word(&mut self, limit: LengthLimit) -> Result<String> {
		self.generate(limit, Some(1))?
			.next()
			.ok_or_else(|| Error::Configuration("No word could be generated".to_owned()))
	}

	/// Generates random words within `limit`.
	///
	/// The sequence is infinite when `count` is `None`; otherwise it yields
	/// exactly `count` words. Each call starts a fresh sequence.
	///
	/// # Errors
	/// Returns [`Error::Unseeded`] if the generator has no model. The check
	/// happens before any random draw.
	pub fn generate(&mut self, limit: LengthLimit, count: Option<usize>) -> Result<Words<'_, '_, StdRng>> {
		let sampler = Sampler::new(&self.model, self.alphabet.marker())?;
		Ok(sampler.words(&mut self.rng, limit, count))
	}
}
