use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::AggregateResolver;
use crate::KwxError;
use crate::KwxResult;
use crate::resolver::Environment;
use crate::resolver::KeywordPairs;
use crate::resolver::LookupResolver;
use crate::resolver::PairsResolver;
use crate::resolver::PropertyResolver;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["kwx.toml", ".kwx.toml", ".config/kwx.toml"];

/// Configuration loaded from a `kwx.toml` file.
///
/// ```toml
/// [[source]]
/// prefix = "pkg"
/// path = "package.json"
///
/// [[source]]
/// prefix = "app"
/// values = { name = "kwx", channel = "stable" }
///
/// [[source]]
/// prefix = "env"
/// environment = true
///
/// [overrides]
/// name = "app"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct KwxConfig {
	/// Keyword sources, registered in the order they appear. This order is
	/// also the search order for keywords that carry no prefix.
	#[serde(default, rename = "source")]
	pub sources: Vec<SourceConfig>,
	/// Bare keyword name to the prefix of the source that must expand it.
	#[serde(default)]
	pub overrides: BTreeMap<String, String>,
}

/// One `[[source]]` entry.
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
pub struct SourceConfig {
	/// The prefix that qualifies keywords from this source, e.g. `pkg` in
	/// `{pkg.version}`.
	pub prefix: String,
	#[serde(flatten)]
	pub kind: SourceKind,
}

/// What backs a `[[source]]` entry.
///
/// ```toml
/// [[source]]
/// prefix = "release"
/// path = "release-info"
/// format = "json"
/// ```
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
#[non_exhaustive]
pub enum SourceKind {
	/// A structured data file whose top-level fields become keywords.
	Data {
		path: PathBuf,
		#[serde(default)]
		format: Option<String>,
	},
	/// Literal name/value pairs.
	Values { values: BTreeMap<String, String> },
	/// The environment of the running process.
	Environment { environment: bool },
}

impl KwxConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if the file does not exist.
	pub fn load(root: &Path) -> KwxResult<Option<KwxConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		Self::load_from(&config_path).map(Some)
	}

	/// Load the config from an explicit file.
	pub fn load_from(path: &Path) -> KwxResult<KwxConfig> {
		tracing::debug!(path = %path.display(), "loading config");
		let content = std::fs::read_to_string(path)?;
		toml::from_str(&content).map_err(|e| KwxError::ConfigParse(e.to_string()))
	}

	/// Build an aggregate resolver holding every configured source.
	pub fn build_resolver(&self, root: &Path) -> KwxResult<AggregateResolver<'static>> {
		let mut aggregate = AggregateResolver::new();
		self.register(root, &mut aggregate)?;
		Ok(aggregate)
	}

	/// Register every configured source and override with `aggregate`.
	/// Data file paths are relative to `root`.
	pub fn register(&self, root: &Path, aggregate: &mut AggregateResolver<'_>) -> KwxResult<()> {
		for source in &self.sources {
			match &source.kind {
				SourceKind::Data { path, format } => {
					let value = load_data_file(root, path, format.as_deref())?;
					aggregate.add(PropertyResolver::new(value), source.prefix.as_str())?;
				}
				SourceKind::Values { values } => {
					let pairs: KeywordPairs = values.iter().collect();
					aggregate.add(PairsResolver::new(pairs), source.prefix.as_str())?;
				}
				SourceKind::Environment { environment } => {
					if *environment {
						aggregate.add(LookupResolver::new(Environment), source.prefix.as_str())?;
					}
				}
			}
		}

		for (keyword, prefix) in &self.overrides {
			aggregate.add_override(keyword.as_str(), prefix)?;
		}

		Ok(())
	}
}

/// Read a data file and parse it into a `serde_json::Value`. Without an
/// explicit format the file extension decides.
pub fn load_data_file(
	root: &Path,
	rel_path: &Path,
	format: Option<&str>,
) -> KwxResult<serde_json::Value> {
	let abs_path = root.join(rel_path);
	let content = std::fs::read_to_string(&abs_path).map_err(|e| KwxError::DataFile {
		path: rel_path.display().to_string(),
		reason: e.to_string(),
	})?;
	let format = match format {
		Some(format) => format.trim().to_ascii_lowercase(),
		None => {
			abs_path
				.extension()
				.and_then(|e| e.to_str())
				.unwrap_or("")
				.to_ascii_lowercase()
		}
	};

	tracing::debug!(path = %rel_path.display(), format = %format, "loading data file");
	parse_data_file(&content, format.as_str(), &rel_path.display().to_string())
}

/// Parse a data file's content into a `serde_json::Value` based on its
/// format.
pub fn parse_data_file(
	content: &str,
	format: &str,
	path_display: &str,
) -> KwxResult<serde_json::Value> {
	let data_error = |reason: String| {
		KwxError::DataFile {
			path: path_display.to_string(),
			reason,
		}
	};

	match format {
		"json" => serde_json::from_str(content).map_err(|e| data_error(e.to_string())),
		"toml" => {
			let toml_value: toml::Value =
				toml::from_str(content).map_err(|e| data_error(e.to_string()))?;
			toml_to_json(toml_value, path_display)
		}
		"yaml" | "yml" => serde_yaml_ng::from_str(content).map_err(|e| data_error(e.to_string())),
		"kdl" => {
			let doc: kdl::KdlDocument = content
				.parse()
				.map_err(|e: kdl::KdlError| data_error(e.to_string()))?;
			kdl_document_to_value(&doc, path_display)
		}
		"ini" => serde_ini::from_str(content).map_err(|e| data_error(e.to_string())),
		other => Err(KwxError::UnsupportedDataFormat(other.to_string())),
	}
}

/// Integers keep their exact value whenever JSON can hold it. Only integers
/// beyond the `u64` range degrade to floats.
fn integer_to_json(value: i128, path_display: &str) -> KwxResult<serde_json::Value> {
	if let Ok(int) = i64::try_from(value) {
		return Ok(serde_json::Value::Number(int.into()));
	}

	if let Ok(int) = u64::try_from(value) {
		return Ok(serde_json::Value::Number(int.into()));
	}

	json_number(value as f64, value.to_string(), path_display)
}

fn json_number(value: f64, raw: String, path_display: &str) -> KwxResult<serde_json::Value> {
	serde_json::Number::from_f64(value)
		.map(serde_json::Value::Number)
		.ok_or_else(|| {
			KwxError::UnconvertibleFloat {
				path: path_display.to_string(),
				value: raw,
			}
		})
}

/// Convert a `toml::Value` to a `serde_json::Value`.
fn toml_to_json(value: toml::Value, path_display: &str) -> KwxResult<serde_json::Value> {
	let json = match value {
		toml::Value::String(s) => serde_json::Value::String(s),
		toml::Value::Integer(i) => integer_to_json(i.into(), path_display)?,
		toml::Value::Float(f) => json_number(f, f.to_string(), path_display)?,
		toml::Value::Boolean(b) => serde_json::Value::Bool(b),
		toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
		toml::Value::Array(arr) => {
			let items: KwxResult<Vec<serde_json::Value>> = arr
				.into_iter()
				.map(|v| toml_to_json(v, path_display))
				.collect();
			serde_json::Value::Array(items?)
		}
		toml::Value::Table(table) => {
			let mut map = serde_json::Map::new();
			for (k, v) in table {
				map.insert(k, toml_to_json(v, path_display)?);
			}
			serde_json::Value::Object(map)
		}
	};

	Ok(json)
}

/// Convert a KDL document to a `serde_json::Value`.
fn kdl_document_to_value(
	doc: &kdl::KdlDocument,
	path_display: &str,
) -> KwxResult<serde_json::Value> {
	let mut map = serde_json::Map::new();

	for node in doc.nodes() {
		let name = node.name().value().to_string();
		let value = kdl_node_to_value(node, path_display)?;
		map.insert(name, value);
	}

	Ok(serde_json::Value::Object(map))
}

/// Convert a KDL node to a `serde_json::Value`.
fn kdl_node_to_value(node: &kdl::KdlNode, path_display: &str) -> KwxResult<serde_json::Value> {
	if let Some(children) = node.children() {
		return kdl_document_to_value(children, path_display);
	}

	let entries = node.entries();
	let entry_value = |entry: &kdl::KdlEntry| kdl_entry_value_to_json(entry.value(), path_display);

	match entries {
		[] => Ok(serde_json::Value::Null),
		[only] if only.name().is_none() => entry_value(only),
		_ if entries.iter().all(|entry| entry.name().is_some()) => {
			entries
				.iter()
				.filter_map(|entry| entry.name().map(|name| (name.value().to_string(), entry)))
				.map(|(name, entry)| entry_value(entry).map(|value| (name, value)))
				.collect::<KwxResult<serde_json::Map<_, _>>>()
				.map(serde_json::Value::Object)
		}
		// Mixed or repeated arguments keep their order and drop property names.
		_ => {
			entries
				.iter()
				.map(entry_value)
				.collect::<KwxResult<Vec<_>>>()
				.map(serde_json::Value::Array)
		}
	}
}

/// Convert a KDL entry value to a `serde_json::Value`.
fn kdl_entry_value_to_json(
	value: &kdl::KdlValue,
	path_display: &str,
) -> KwxResult<serde_json::Value> {
	match value {
		kdl::KdlValue::String(s) => Ok(serde_json::Value::String(s.clone())),
		kdl::KdlValue::Integer(i) => integer_to_json(*i, path_display),
		kdl::KdlValue::Float(f) => json_number(*f, f.to_string(), path_display),
		kdl::KdlValue::Bool(b) => Ok(serde_json::Value::Bool(*b)),
		kdl::KdlValue::Null => Ok(serde_json::Value::Null),
	}
}
