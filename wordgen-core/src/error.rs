use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the word generator.
///
/// Every operation propagates these to its caller; nothing is retried or
/// recovered internally.
#[derive(Error, Debug)]
pub enum Error {
	/// Invalid alphabet, seed sources, length limit or model combination.
	#[error("Invalid configuration: {0}")]
	Configuration(String),

	/// Generation was requested before any successful seed or load.
	#[error("Before generating words, the word generator must be seeded with words from a language")]
	Unseeded,

	/// A persisted model could not be decoded.
	#[error("Malformed model: {0}")]
	Format(String),

	/// I/O failure on a named file.
	#[error("I/O error for {path}: {source}")]
	Resource {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// I/O failure on an anonymous reader or writer.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl Error {
	pub(crate) fn resource(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
		let path = path.into();
		move |source| Self::Resource { path, source }
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		// Reader failures keep their I/O kind, everything else is a bad document.
		if err.is_io() {
			Self::Io(err.into())
		} else {
			Self::Format(err.to_string())
		}
	}
}

impl From<postcard::Error> for Error {
	fn from(err: postcard::Error) -> Self {
		Self::Format(err.to_string())
	}
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
