use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum KwxError {
	#[error(transparent)]
	#[diagnostic(code(kwx::io_error))]
	Io(#[from] std::io::Error),

	#[error("unable to expand keyword `{keyword}`")]
	#[diagnostic(code(kwx::keyword_resolution))]
	KeywordResolution {
		keyword: String,
		source: Box<KwxError>,
	},

	#[error("cannot expand keyword: `{0}`")]
	#[diagnostic(
		code(kwx::keyword_not_found),
		help("qualify the keyword with a registered prefix, e.g. `{{prefix.keyword}}`")
	)]
	KeywordNotFound(String),

	#[error("no field named `{0}` on the wrapped value")]
	#[diagnostic(code(kwx::field_not_found))]
	FieldNotFound(String),

	#[error("operation not supported: {0}")]
	#[diagnostic(code(kwx::unsupported_operation))]
	UnsupportedOperation(String),

	#[error("a resolver is already registered under the prefix `{0}`")]
	#[diagnostic(
		code(kwx::duplicate_prefix),
		help("each resolver in an aggregate must use a unique prefix")
	)]
	DuplicatePrefix(String),

	#[error("no resolver is registered under the prefix `{0}`")]
	#[diagnostic(
		code(kwx::unknown_prefix),
		help("register the resolver before pointing an override at it")
	)]
	UnknownPrefix(String),

	#[error("failed to serialize value for keyword lookup: {0}")]
	#[diagnostic(code(kwx::serialize))]
	Serialize(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(kwx::config_parse),
		help("check that kwx.toml is valid TOML with [[source]] and/or [overrides] sections")
	)]
	ConfigParse(String),

	#[error("failed to load data file `{path}`: {reason}")]
	#[diagnostic(code(kwx::data_file))]
	DataFile { path: String, reason: String },

	#[error("failed to open input file `{path}`: {reason}")]
	#[diagnostic(
		code(kwx::input_file),
		help("pass `-` or omit INPUT to read from stdin")
	)]
	InputFile { path: String, reason: String },

	#[error("failed to create output file `{path}`: {reason}")]
	#[diagnostic(code(kwx::output_file))]
	OutputFile { path: String, reason: String },

	#[error("unsupported data file format: `{0}`")]
	#[diagnostic(
		code(kwx::unsupported_format),
		help("supported formats: json, toml, yaml, yml, kdl, ini")
	)]
	UnsupportedDataFormat(String),

	#[error("unconvertible float value in data file `{path}`: {value}")]
	#[diagnostic(
		code(kwx::unconvertible_float),
		help("NaN and Infinity are not valid JSON numbers")
	)]
	UnconvertibleFloat { path: String, value: String },
}

impl KwxError {
	/// The keyword that failed to expand, when this error came out of a scan.
	pub fn keyword(&self) -> Option<&str> {
		match self {
			Self::KeywordResolution { keyword, .. } => Some(keyword),
			_ => None,
		}
	}
}

pub type KwxResult<T> = Result<T, KwxError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
