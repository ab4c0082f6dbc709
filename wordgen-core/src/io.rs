use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::{env, io};

use crate::error::{Error, Result};

/// Reads a dictionary file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub fn read_words<P: AsRef<Path>>(filename: P) -> Result<Vec<String>> {
	let path = filename.as_ref();
	let file = File::open(path).map_err(Error::resource(path))?;
	read_lines(file).map_err(|err| match err {
		Error::Io(source) => Error::Resource { path: path.to_owned(), source },
		other => other,
	})
}

/// Reads every line of a reader (standard input, an open file...).
pub fn read_lines<R: Read>(mut reader: R) -> Result<Vec<String>> {
	let mut contents = String::new();
	reader.read_to_string(&mut contents)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/english.dat` + `"bin"` → `data/english.bin`
pub fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/english.dat"` → `"english"`
/// - `"english.dat"` → `"english"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists all files with a given extension in a directory.
///
/// Returns file names only (no paths), sorted.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();

		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}
	files.sort();

	Ok(files)
}

/// Returns `true` if `derived` exists and is at least as recent as `source`.
pub(crate) fn is_up_to_date<P: AsRef<Path>, Q: AsRef<Path>>(source: P, derived: Q) -> bool {
	let modified = |path: &Path| fs::metadata(path).and_then(|m| m.modified()).ok();
	match (modified(source.as_ref()), modified(derived.as_ref())) {
		(Some(source), Some(derived)) => derived >= source,
		(None, Some(_)) => true,
		_ => false,
	}
}
