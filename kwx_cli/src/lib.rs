use std::path::Path;
use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use kwx_core::AggregateResolver;
use kwx_core::KeywordPairs;
use kwx_core::KwxResult;
use kwx_core::PairsResolver;
use kwx_core::config::KwxConfig;

/// Prefix under which `--set` assignments are registered.
pub const ASSIGNMENT_PREFIX: &str = "set";

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Expand {keyword} placeholders in text using data files, values and the environment.",
	long_about = "kwx (keyword expander) streams text and replaces every `{keyword}` placeholder \
	              with text from a configured source.\n\nSources are declared in `kwx.toml` and \
	              addressed as `{prefix.keyword}`; unqualified keywords are searched in \
	              declaration order. Write `\\{` for a literal brace and `\\\\` for a literal \
	              backslash.\n\nQuick start:\n  kwx expand input.txt --set name=world\n  kwx \
	              keywords    List every keyword the configured sources know"
)]
pub struct KwxCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory, used to discover `kwx.toml` and
	/// to resolve data file paths.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Explicit config file to load instead of discovering one.
	#[arg(long, global = true)]
	pub config: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Expand every placeholder in the input.
	///
	/// Reads from INPUT (or stdin when INPUT is absent or `-`) and writes the
	/// expanded text to `--output` (or stdout). Text is streamed, so output
	/// written before a failing placeholder is kept.
	Expand {
		/// File to expand. Reads stdin when absent or `-`.
		input: Option<PathBuf>,

		/// File to write the expanded text to. Writes stdout when absent.
		#[arg(long, short)]
		output: Option<PathBuf>,

		/// Extra `KEY=VALUE` pairs, searched before every configured source.
		#[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
		assignments: Vec<(String, String)>,
	},
	/// List every keyword the configured sources know, qualified by prefix.
	Keywords {
		/// Output format. Use `text` for one keyword per line or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,

		/// Extra `KEY=VALUE` pairs, listed under the `set` prefix.
		#[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
		assignments: Vec<(String, String)>,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// One keyword per line.
	Text,
	/// A JSON array of keywords.
	Json,
}

/// Parse a `KEY=VALUE` assignment. The value may itself contain `=`.
pub fn parse_assignment(input: &str) -> Result<(String, String), String> {
	let Some((key, value)) = input.split_once('=') else {
		return Err(format!("expected KEY=VALUE, got `{input}`"));
	};

	let key = key.trim();
	if key.is_empty() {
		return Err(format!("missing key in `{input}`"));
	}

	Ok((key.to_string(), value.to_string()))
}

/// Build the aggregate resolver for a run: `--set` assignments first, then
/// every source from the config file (explicit or discovered under `root`).
pub fn build_resolver(
	root: &Path,
	config_path: Option<&Path>,
	assignments: &[(String, String)],
) -> KwxResult<AggregateResolver<'static>> {
	let mut aggregate = AggregateResolver::new();

	if !assignments.is_empty() {
		let pairs: KeywordPairs = assignments.iter().cloned().collect();
		aggregate.add(PairsResolver::new(pairs), ASSIGNMENT_PREFIX)?;
	}

	let config = match config_path {
		Some(path) => Some(KwxConfig::load_from(path)?),
		None => KwxConfig::load(root)?,
	};

	if let Some(config) = config {
		config.register(root, &mut aggregate)?;
	} else {
		tracing::debug!(root = %root.display(), "no config file found");
	}

	Ok(aggregate)
}

#[cfg(test)]
mod tests {
	use rstest::rstest;
	use similar_asserts::assert_eq;

	use super::*;

	#[rstest]
	#[case::simple("name=world", ("name", "world"))]
	#[case::empty_value("name=", ("name", ""))]
	#[case::value_with_equals("query=a=b", ("query", "a=b"))]
	#[case::trimmed_key(" name =x", ("name", "x"))]
	fn parses_assignments(#[case] input: &str, #[case] expected: (&str, &str)) {
		let (key, value) = parse_assignment(input).unwrap_or_else(|e| panic!("{e}"));
		assert_eq!((key.as_str(), value.as_str()), expected);
	}

	#[rstest]
	#[case::no_equals("name")]
	#[case::no_key("=value")]
	fn rejects_bad_assignments(#[case] input: &str) {
		assert!(parse_assignment(input).is_err());
	}
}
