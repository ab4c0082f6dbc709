//! Command-line front end: learn a language (or load a saved model), then
//! either save the model or print generated words.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use log::debug;
use wordgen_core::io::read_lines;
use wordgen_core::{Alphabet, LengthLimit, ModelFormat, Seed, WordGenerator};

/// On-disk model encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Binary,
}

impl From<Format> for ModelFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => ModelFormat::Json,
            Format::Binary => ModelFormat::Binary,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "wordgen")]
#[command(about = "A generator for word-like strings that follow the 'feel' of a given input language.")]
#[command(version)]
struct Cli {
    /// The path to a dictionary file for a language - a list of newline
    /// separated words (default: read from standard input)
    #[arg(value_name = "FILE", conflicts_with = "load")]
    dictionary: Option<PathBuf>,

    /// If true, a common segment in the language is more likely to show up
    /// in an output word
    #[arg(short, long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set)]
    weighted: bool,

    /// The number of words to generate
    #[arg(short, long, value_name = "N", default_value_t = 1)]
    number: usize,

    /// The minimum length of words to generate
    #[arg(long, value_name = "N", default_value_t = 0)]
    min: usize,

    /// The rough maximum length of words to generate
    #[arg(short, long, value_name = "N", default_value_t = 14)]
    max: usize,

    /// Save the model to disc. When saving, no words are generated
    #[arg(short, long, value_name = "FILE", conflicts_with_all = ["output", "number", "min", "max"])]
    save: Option<PathBuf>,

    /// Save the model, sending output to the standard output
    #[arg(short, long, conflicts_with_all = ["number", "min", "max"])]
    output: bool,

    /// Load the model from disc instead of learning a dictionary
    #[arg(short, long, value_name = "FILE")]
    load: Option<PathBuf>,

    /// Add another dictionary to the model (can be repeated)
    #[arg(short, long, value_name = "FILE")]
    append: Vec<PathBuf>,

    /// The vowels of the input language
    #[arg(long, default_value = "aeiou")]
    vowels: String,

    /// Character marking the start and end of words; must not appear in the
    /// dictionary
    #[arg(long, default_value_t = '~')]
    marker: char,

    /// Model encoding (default: guessed from the file extension, JSON for
    /// standard output)
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Seed of the random generator, for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn format_for(&self, path: Option<&Path>) -> ModelFormat {
        match (self.format, path) {
            (Some(format), _) => format.into(),
            (None, Some(path)) => ModelFormat::from_path(path),
            (None, None) => ModelFormat::Json,
        }
    }
}

/// Learns or loads the model the command line asks for.
fn build_generator(cli: &Cli) -> Result<WordGenerator> {
    let alphabet = Alphabet::new(cli.vowels.chars(), cli.marker)?;
    let mut generator = WordGenerator::new(alphabet, cli.weighted);
    if let Some(seed) = cli.seed {
        generator = generator.with_rng_seed(seed);
    }

    if let Some(path) = &cli.load {
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        generator.load(file, cli.format_for(Some(path.as_path())))?;
    } else if let Some(path) = &cli.dictionary {
        generator.seed(Seed::new().dictionary(path))?;
    } else {
        debug!("Reading dictionary from standard input");
        let words = read_lines(io::stdin().lock())?;
        generator.seed(Seed::new().language(words))?;
    }

    for path in &cli.append {
        generator.seed(Seed::new().dictionary(path).append(true))?;
    }

    Ok(generator)
}

fn run(cli: Cli) -> Result<()> {
    let mut generator = build_generator(&cli)?;

    if let Some(path) = &cli.save {
        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        generator.save(BufWriter::new(file), cli.format_for(Some(path.as_path())))?;
    } else if cli.output {
        generator.save(io::stdout().lock(), cli.format_for(None))?;
    } else {
        let limit = LengthLimit::range(cli.min, cli.max)?;
        let mut out = BufWriter::new(io::stdout().lock());
        for word in generator.generate(limit, Some(cli.number))? {
            writeln!(out, "{}", word)?;
        }
        out.flush()?;
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    run(Cli::parse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::ffi::OsStr;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["wordgen", "words.dat"]).unwrap();
        assert_eq!(cli.dictionary, Some(PathBuf::from("words.dat")));
        assert!(cli.weighted);
        assert_eq!(cli.number, 1);
        assert_eq!(cli.min, 0);
        assert_eq!(cli.max, 14);
        assert_eq!(cli.marker, '~');
        assert_eq!(cli.format_for(None), ModelFormat::Json);
    }

    #[test]
    fn test_weighted_takes_a_value() {
        let cli = Cli::try_parse_from(["wordgen", "-w", "false", "words.dat"]).unwrap();
        assert!(!cli.weighted);
    }

    #[test]
    fn test_save_and_generate_are_exclusive() {
        assert!(Cli::try_parse_from(["wordgen", "-s", "model.json", "-n", "5", "words.dat"]).is_err());
        assert!(Cli::try_parse_from(["wordgen", "-s", "model.json", "-o", "words.dat"]).is_err());
        assert!(Cli::try_parse_from(["wordgen", "-o", "--max", "9"]).is_err());
    }

    #[test]
    fn test_load_conflicts_with_dictionary() {
        assert!(Cli::try_parse_from(["wordgen", "-l", "model.json", "words.dat"]).is_err());
        assert!(Cli::try_parse_from(["wordgen", "-l", "model.json", "-a", "more.dat"]).is_ok());
    }

    #[test]
    fn test_format_selection() {
        let cli = Cli::try_parse_from(["wordgen", "-s", "model.bin", "words.dat"]).unwrap();
        assert_eq!(cli.format_for(cli.save.as_deref()), ModelFormat::Binary);

        let cli = Cli::try_parse_from(["wordgen", "--format", "binary", "-o", "words.dat"]).unwrap();
        assert_eq!(cli.format_for(None), ModelFormat::Binary);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let dictionary = dir.path().join("words.dat");
        let model = dir.path().join("model.json");
        std::fs::write(&dictionary, "banana\napple\ncherry\n").unwrap();

        let save = Cli::try_parse_from([
            OsStr::new("wordgen"),
            OsStr::new("-s"),
            model.as_os_str(),
            dictionary.as_os_str(),
        ])
        .unwrap();
        run(save).unwrap();

        let load = Cli::try_parse_from([OsStr::new("wordgen"), OsStr::new("-l"), model.as_os_str()]).unwrap();
        let generator = build_generator(&load).unwrap();
        assert!(generator.is_seeded());
        assert!(generator.is_weighted());
    }
}
