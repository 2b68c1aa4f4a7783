use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;

use crate::MdonError;
use crate::MdonResult;
use crate::engine::DEFAULT_MAX_DEPTH;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["mdon.toml", ".mdon.toml", ".config/mdon.toml"];

/// Metadata files tried, in order, when no manifest is configured.
pub const MANIFEST_CANDIDATES: [&str; 2] = ["package.json", "Cargo.toml"];

/// Document processed when none are configured.
pub const DEFAULT_DOCUMENT: &str = "README.md";

/// Directory checked first for the raw version of a document.
pub const DEFAULT_DOCS_DIR: &str = "docs";

/// Where processed output goes.
///
/// ```toml
/// output = true     # overwrite the document
/// output = false    # only return the output
/// output = ".out"   # write README.out.md next to README.md
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
#[non_exhaustive]
#[allow(variant_size_differences)]
pub enum OutputSetting {
	Enabled(bool),
	Suffix(String),
}

impl Default for OutputSetting {
	fn default() -> Self {
		Self::Enabled(true)
	}
}

/// Configuration loaded from an `mdon.toml` file.
///
/// ```toml
/// manifest = "package.json"
/// documents = ["README.md", "CONTRIBUTING.md"]
/// output = ".out"
/// backup = true
/// roundtrips = 1
/// strict = false
/// max_depth = 16
/// docs_dir = "docs"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct MdonConfig {
	/// Metadata file relative to the root.
	#[serde(default)]
	pub manifest: Option<PathBuf>,
	/// Documents to process, relative to the root.
	#[serde(default)]
	pub documents: Vec<PathBuf>,
	#[serde(default)]
	pub output: OutputSetting,
	/// Rename an existing output file to `<name>.<n>` before writing.
	#[serde(default)]
	pub backup: bool,
	/// Extra passes over the output with the same context.
	#[serde(default)]
	pub roundtrips: usize,
	/// Treat unterminated directives as an error.
	#[serde(default)]
	pub strict: bool,
	#[serde(default = "default_max_depth")]
	pub max_depth: usize,
	#[serde(default)]
	pub docs_dir: Option<PathBuf>,
}

impl Default for MdonConfig {
	fn default() -> Self {
		Self {
			manifest: None,
			documents: Vec::new(),
			output: OutputSetting::default(),
			backup: false,
			roundtrips: 0,
			strict: false,
			max_depth: DEFAULT_MAX_DEPTH,
			docs_dir: None,
		}
	}
}

fn default_max_depth() -> usize {
	DEFAULT_MAX_DEPTH
}

impl MdonConfig {
	/// Resolve the first existing config file path at `root`.
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if there is none.
	pub fn load(root: &Path) -> MdonResult<Option<MdonConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config: MdonConfig =
			toml::from_str(&content).map_err(|e| MdonError::ConfigParse(e.to_string()))?;
		tracing::debug!(path = %config_path.display(), "loaded config");

		Ok(Some(config))
	}
}

/// Load the metadata properties of a project.
///
/// With no `manifest` the first existing [`MANIFEST_CANDIDATES`] entry is
/// used. A project without any manifest has no properties.
pub fn load_metadata(root: &Path, manifest: Option<&Path>) -> MdonResult<Map<String, Value>> {
	let relative = match manifest {
		Some(manifest) => manifest.to_path_buf(),
		None => {
			let Some(candidate) = MANIFEST_CANDIDATES
				.iter()
				.map(PathBuf::from)
				.find(|candidate| root.join(candidate).is_file())
			else {
				tracing::debug!("no manifest found, continuing without metadata");
				return Ok(Map::new());
			};
			candidate
		}
	};

	let path_display = relative.display().to_string();
	let content = std::fs::read_to_string(root.join(&relative)).map_err(|e| {
		MdonError::MetadataFile {
			path: path_display.clone(),
			reason: e.to_string(),
		}
	})?;
	let format = relative
		.extension()
		.and_then(|e| e.to_str())
		.unwrap_or("")
		.to_ascii_lowercase();

	match parse_metadata_file(&content, &format, &path_display)? {
		Value::Object(properties) => {
			tracing::debug!(path = %path_display, properties = properties.len(), "loaded metadata");
			Ok(properties)
		}
		_ => {
			Err(MdonError::MetadataFile {
				path: path_display,
				reason: "the top level must be a table or object".to_string(),
			})
		}
	}
}

fn parse_metadata_file(content: &str, format: &str, path_display: &str) -> MdonResult<Value> {
	let invalid = |reason: String| {
		MdonError::MetadataFile {
			path: path_display.to_string(),
			reason,
		}
	};

	match format {
		"json" => serde_json::from_str(content).map_err(|e| invalid(e.to_string())),
		"toml" => {
			let toml_value: toml::Value =
				toml::from_str(content).map_err(|e| invalid(e.to_string()))?;
			toml_to_json(toml_value).ok_or_else(|| invalid("non-finite float".to_string()))
		}
		"yaml" | "yml" => serde_yaml_ng::from_str(content).map_err(|e| invalid(e.to_string())),
		other => Err(MdonError::UnsupportedMetadataFormat(other.to_string())),
	}
}

/// Convert a `toml::Value` to a `serde_json::Value`. Returns `None` for
/// floats JSON cannot hold.
fn toml_to_json(value: toml::Value) -> Option<Value> {
	let json = match value {
		toml::Value::String(s) => Value::String(s),
		toml::Value::Integer(i) => Value::from(i),
		toml::Value::Float(f) => Value::Number(serde_json::Number::from_f64(f)?),
		toml::Value::Boolean(b) => Value::Bool(b),
		toml::Value::Datetime(dt) => Value::String(dt.to_string()),
		toml::Value::Array(arr) => {
			Value::Array(arr.into_iter().map(toml_to_json).collect::<Option<_>>()?)
		}
		toml::Value::Table(table) => {
			let mut map = Map::new();
			for (k, v) in table {
				map.insert(k, toml_to_json(v)?);
			}
			Value::Object(map)
		}
	};

	Some(json)
}
