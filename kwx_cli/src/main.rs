use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use kwx_cli::Commands;
use kwx_cli::KwxCli;
use kwx_cli::OutputFormat;
use kwx_cli::build_resolver;
use kwx_core::AnyEmptyResult;
use kwx_core::Expander;
use kwx_core::KeywordResolver;
use kwx_core::KwxError;
use kwx_core::KwxResult;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = KwxCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose, use_color);

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Expand {
			input,
			output,
			assignments,
		}) => run_expand(&args, input.as_deref(), output.as_deref(), assignments),
		Some(Commands::Keywords {
			format,
			assignments,
		}) => run_keywords(&args, *format, assignments),
		None => {
			eprintln!("No subcommand specified. Run `kwx --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		match e.downcast::<KwxError>() {
			Ok(kwx_err) => {
				let report: miette::Report = (*kwx_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Diagnostics go to stderr so they never mix with expanded output. `KWX_LOG`
/// takes precedence over `--verbose`.
fn init_tracing(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_env("KWX_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::registry()
		.with(filter)
		.with(
			tracing_subscriber::fmt::layer()
				.with_writer(std::io::stderr)
				.with_ansi(use_color)
				.compact(),
		)
		.init();
}

fn resolve_root(args: &KwxCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn run_expand(
	args: &KwxCli,
	input: Option<&Path>,
	output: Option<&Path>,
	assignments: &[(String, String)],
) -> AnyEmptyResult {
	let root = resolve_root(args);
	let resolver = build_resolver(&root, args.config.as_deref(), assignments)?;
	let expander = Expander::new(resolver);

	let reader: Box<dyn BufRead> = match input {
		Some(path) if path != Path::new("-") => {
			let file = File::open(path).map_err(|e| {
				KwxError::InputFile {
					path: path.display().to_string(),
					reason: e.to_string(),
				}
			})?;
			Box::new(BufReader::new(file))
		}
		_ => Box::new(std::io::stdin().lock()),
	};

	let writer: Box<dyn Write> = match output {
		Some(path) => {
			let file = File::create(path).map_err(|e| {
				KwxError::OutputFile {
					path: path.display().to_string(),
					reason: e.to_string(),
				}
			})?;
			Box::new(BufWriter::new(file))
		}
		None => Box::new(BufWriter::new(std::io::stdout().lock())),
	};

	expander.expand_reader(reader, writer)?;

	Ok(())
}

fn run_keywords(
	args: &KwxCli,
	format: OutputFormat,
	assignments: &[(String, String)],
) -> AnyEmptyResult {
	let root = resolve_root(args);
	let resolver = build_resolver(&root, args.config.as_deref(), assignments)?;
	let keywords = resolver.known_keywords().collect::<KwxResult<Vec<_>>>()?;

	match format {
		OutputFormat::Json => {
			println!("{}", serde_json::to_string_pretty(&keywords)?);
		}
		OutputFormat::Text => {
			if keywords.is_empty() {
				eprintln!("{}", colored!("No keywords found.", yellow));
				return Ok(());
			}

			let stdout = std::io::stdout();
			let mut out = stdout.lock();
			for keyword in &keywords {
				writeln!(out, "{keyword}")?;
			}
		}
	}

	Ok(())
}
