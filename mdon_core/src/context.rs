use std::collections::HashMap;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use chrono::DateTime;
use chrono::Utc;
use serde_json::Map;
use serde_json::Value;

use crate::MdonError;
use crate::MdonResult;
use crate::engine::ProcessOptions;
use crate::engine::parse_nested;
use crate::fragments::has_directives;
use crate::grammar::normalize_alias;

/// The operations a directive expression can reach through `@name(...)`,
/// together with the property lookups behind `{{ path }}` and `this`.
///
/// [`Context`] is the implementation used for documents. The evaluator only
/// depends on this trait.
pub trait Capabilities {
	/// Look up a top-level property.
	fn property(&self, name: &str) -> Option<Value>;
	/// Every property as one object, for `this`.
	fn snapshot(&self) -> Value;
	/// Render a value for output. Strings, numbers and booleans pass through,
	/// anything else becomes an inline comment.
	fn format(&self, value: &Value) -> String;
	/// The absolute path of `reference` when it exists, otherwise `false`.
	fn resolve(&self, reference: &str) -> Value;
	/// The alias for `reference`, created on first request.
	fn alias(&mut self, reference: &str, prefix: &str) -> MdonResult<String>;
	/// The reference recorded for `alias`.
	fn reference(&self, alias: &str) -> MdonResult<String>;
	/// The path of `reference` relative to the base path, formatted.
	fn exists(&self, reference: &str) -> String;
	/// The content of the file at `reference`, parsed when it holds
	/// directives.
	fn include(&mut self, reference: &str) -> MdonResult<String>;
	/// Run the whole pipeline over `markdown` without appending a footer.
	fn parse(&mut self, markdown: &str) -> MdonResult<String>;
	/// The "Last Updated" stamp.
	fn timestamp(&self) -> String;
	/// The link-reference block, one `[alias]: reference` line per entry.
	fn links(&self) -> String;
}

/// One `(alias, reference)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
	pub alias: String,
	pub reference: String,
}

/// Aliases handed out by one context, kept in creation order.
///
/// Each reference maps to exactly one alias and each alias to exactly one
/// reference. Entries are never removed, so the entry count doubles as the
/// counter for fresh aliases.
#[derive(Debug, Clone, Default)]
pub struct LinkTable {
	entries: Vec<Link>,
	by_reference: HashMap<String, usize>,
	by_alias: HashMap<String, usize>,
}

impl LinkTable {
	/// Return the alias of `reference`, creating `<prefix>-<n>` if this is
	/// the first request for it.
	pub fn alias(&mut self, reference: &str, prefix: &str) -> MdonResult<String> {
		let trimmed = reference.trim();
		if trimmed.is_empty() {
			return Err(MdonError::BlankReference(reference.to_string()));
		}

		let Some(prefix) = normalize_alias(prefix) else {
			return Err(MdonError::InvalidPrefix {
				reference: reference.to_string(),
				prefix: prefix.to_string(),
			});
		};

		if let Some(&index) = self.by_reference.get(trimmed) {
			return Ok(self.entries[index].alias.clone());
		}

		let alias = format!("{prefix}-{}", self.entries.len() + 1);
		let index = self.entries.len();
		self.entries.push(Link {
			alias: alias.clone(),
			reference: trimmed.to_string(),
		});
		self.by_reference.insert(trimmed.to_string(), index);
		self.by_alias.insert(alias.clone(), index);
		tracing::debug!(%alias, reference = trimmed, "created alias");

		Ok(alias)
	}

	/// Return the reference recorded for `alias`.
	pub fn reference(&self, alias: &str) -> MdonResult<&str> {
		let Some(normalized) = normalize_alias(alias) else {
			return Err(MdonError::InvalidAlias(alias.to_string()));
		};

		self.by_alias
			.get(&normalized)
			.map(|&index| self.entries[index].reference.as_str())
			.ok_or_else(|| MdonError::UnknownAlias(alias.to_string()))
	}

	pub fn iter(&self) -> impl Iterator<Item = &Link> {
		self.entries.iter()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Render the table as link-reference definitions.
	pub fn render(&self) -> String {
		self.iter()
			.map(|link| format!("[{}]: {}\n", link.alias, link.reference))
			.collect()
	}
}

/// The evaluation environment of one document.
///
/// Nested `@include` and `@parse` calls reuse the same context, so aliases
/// accumulate across the whole document tree.
#[derive(Debug, Clone)]
pub struct Context {
	properties: Map<String, Value>,
	path: PathBuf,
	links: LinkTable,
	options: ProcessOptions,
	depth: usize,
	includes: Vec<PathBuf>,
}

impl Context {
	/// Create a context from metadata properties and the base path used to
	/// resolve relative references.
	pub fn new(properties: Map<String, Value>, path: impl AsRef<Path>) -> Self {
		let path = std::path::absolute(path.as_ref()).unwrap_or_else(|_| path.as_ref().to_path_buf());

		Self {
			properties,
			path: clean_path(path),
			links: LinkTable::default(),
			options: ProcessOptions::default(),
			depth: 0,
			includes: Vec::new(),
		}
	}

	#[must_use]
	pub fn with_options(mut self, options: ProcessOptions) -> Self {
		self.options = options;
		self
	}

	pub fn properties(&self) -> &Map<String, Value> {
		&self.properties
	}

	/// The base path for relative references.
	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn link_table(&self) -> &LinkTable {
		&self.links
	}

	pub fn options(&self) -> &ProcessOptions {
		&self.options
	}
}

impl Capabilities for Context {
	fn property(&self, name: &str) -> Option<Value> {
		if name == "path" {
			return Some(Value::String(self.path.display().to_string()));
		}

		self.properties.get(name).cloned()
	}

	fn snapshot(&self) -> Value {
		let mut object = self.properties.clone();
		object.insert(
			"path".to_string(),
			Value::String(self.path.display().to_string()),
		);
		Value::Object(object)
	}

	fn format(&self, value: &Value) -> String {
		format_value(value)
	}

	fn resolve(&self, reference: &str) -> Value {
		let reference = reference.trim().trim_start_matches(['/', '\\']);
		if reference.is_empty() {
			return Value::Bool(false);
		}

		let candidate = clean_path(self.path.join(reference));
		if candidate.exists() {
			Value::String(candidate.display().to_string())
		} else {
			Value::Bool(false)
		}
	}

	fn alias(&mut self, reference: &str, prefix: &str) -> MdonResult<String> {
		self.links.alias(reference, prefix)
	}

	fn reference(&self, alias: &str) -> MdonResult<String> {
		self.links.reference(alias).map(str::to_string)
	}

	fn exists(&self, reference: &str) -> String {
		let Value::String(resolved) = self.resolve(reference) else {
			return self.format(&Value::Bool(false));
		};

		let resolved = PathBuf::from(resolved);
		let relative = resolved
			.strip_prefix(&self.path)
			.map_or_else(|_| resolved.clone(), Path::to_path_buf);
		self.format(&Value::String(
			relative.to_string_lossy().replace('\\', "/"),
		))
	}

	fn include(&mut self, reference: &str) -> MdonResult<String> {
		let Value::String(resolved) = self.resolve(reference) else {
			return Err(MdonError::Unresolved(reference.to_string()));
		};

		let resolved = PathBuf::from(resolved);
		if self.includes.contains(&resolved) {
			return Err(MdonError::IncludeCycle(reference.to_string()));
		}

		let content = std::fs::read_to_string(&resolved)?;
		if !has_directives(&content) {
			return Ok(self.format(&Value::String(content)));
		}

		tracing::debug!(path = %resolved.display(), "including document with directives");
		self.includes.push(resolved);
		let result = self.parse(&content);
		self.includes.pop();
		result
	}

	fn parse(&mut self, markdown: &str) -> MdonResult<String> {
		if self.depth >= self.options.max_depth {
			return Err(MdonError::RecursionLimit(self.options.max_depth));
		}

		self.depth += 1;
		let result = parse_nested(markdown, self);
		self.depth -= 1;

		Ok(self.format(&Value::String(result?)))
	}

	fn timestamp(&self) -> String {
		self.options
			.timestamp
			.clone()
			.unwrap_or_else(|| datestamp(Utc::now()))
	}

	fn links(&self) -> String {
		self.links.render()
	}
}

/// Render a value the way directive output shows it.
pub fn format_value(value: &Value) -> String {
	match value {
		Value::String(string) => string.clone(),
		Value::Number(number) => format_number(number),
		Value::Bool(boolean) => boolean.to_string(),
		other => format!("<!-- `{other}` -->"),
	}
}

/// Render a value as text for concatenation.
pub fn display_value(value: &Value) -> String {
	match value {
		Value::String(string) => string.clone(),
		Value::Number(number) => format_number(number),
		other => other.to_string(),
	}
}

/// Whole floats print without a fractional part, so `2` stays `2`.
pub fn format_number(number: &serde_json::Number) -> String {
	if number.is_f64() {
		if let Some(float) = number.as_f64() {
			if float.fract() == 0.0 && float.abs() < 1e15 {
				return format!("{}", float as i64);
			}
			return float.to_string();
		}
	}

	number.to_string()
}

/// Format `date` like `Saturday, October 17, 2026, 1:05:09 PM UTC`.
pub fn datestamp(date: DateTime<Utc>) -> String {
	date.format("%A, %B %-d, %Y, %-I:%M:%S %p UTC").to_string()
}

/// Lexically normalize a path, dropping `.` and resolving `..` where
/// possible.
pub(crate) fn clean_path(path: impl AsRef<Path>) -> PathBuf {
	let mut out: Vec<Component<'_>> = Vec::new();

	for component in path.as_ref().components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				match out.last() {
					Some(Component::RootDir) => {}
					Some(Component::Normal(_)) => {
						out.pop();
					}
					None | Some(Component::CurDir | Component::ParentDir | Component::Prefix(_)) => {
						out.push(component);
					}
				}
			}
			other => out.push(other),
		}
	}

	if out.is_empty() {
		PathBuf::from(".")
	} else {
		out.iter().collect()
	}
}
