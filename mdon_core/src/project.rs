use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::Instant;

use serde_json::Map;
use serde_json::Value;

use crate::MdonError;
use crate::MdonResult;
use crate::config::DEFAULT_DOCS_DIR;
use crate::config::DEFAULT_DOCUMENT;
use crate::config::MdonConfig;
use crate::config::OutputSetting;
use crate::config::load_metadata;
use crate::context::Context;
use crate::engine::DEFAULT_MAX_DEPTH;
use crate::engine::ProcessOptions;
use crate::engine::parse;
use crate::fragments::Unterminated;
use crate::grammar::SUFFIX;
use crate::grammar::comment_tags;

/// Where processed output is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
	/// Overwrite the document.
	InPlace,
	/// Write next to the document with the suffix before its extension.
	Suffix(String),
	/// Do not write anything.
	None,
}

impl From<&OutputSetting> for OutputTarget {
	fn from(setting: &OutputSetting) -> Self {
		match setting {
			OutputSetting::Enabled(true) => Self::InPlace,
			OutputSetting::Enabled(false) => Self::None,
			OutputSetting::Suffix(suffix) => Self::Suffix(suffix.clone()),
		}
	}
}

/// Options controlling how a project's documents are processed.
///
/// Use [`ProjectOptions::new`] for defaults or
/// [`ProjectOptions::from_config`] to construct from an [`MdonConfig`].
#[derive(Debug, Clone)]
pub struct ProjectOptions {
	/// Project root. Documents, the manifest and includes resolve against it.
	pub root: PathBuf,
	/// Metadata file relative to the root.
	pub manifest: Option<PathBuf>,
	/// Documents relative to the root.
	pub documents: Vec<PathBuf>,
	pub output: OutputTarget,
	pub backup: bool,
	pub roundtrips: usize,
	/// Directory, relative to the root, holding raw document sources.
	pub docs_dir: PathBuf,
	pub process: ProcessOptions,
}

impl ProjectOptions {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self::from_config(root, None)
	}

	/// Construct [`ProjectOptions`] from an optional [`MdonConfig`], filling
	/// in defaults for anything it leaves unset.
	pub fn from_config(root: impl Into<PathBuf>, config: Option<&MdonConfig>) -> Self {
		let documents = config
			.map(|c| c.documents.clone())
			.filter(|documents| !documents.is_empty())
			.unwrap_or_else(|| vec![PathBuf::from(DEFAULT_DOCUMENT)]);
		let docs_dir = config
			.and_then(|c| c.docs_dir.clone())
			.unwrap_or_else(|| PathBuf::from(DEFAULT_DOCS_DIR));
		let unterminated = if config.is_some_and(|c| c.strict) {
			Unterminated::Reject
		} else {
			Unterminated::Absorb
		};

		Self {
			root: root.into(),
			manifest: config.and_then(|c| c.manifest.clone()),
			documents,
			output: config.map_or(OutputTarget::InPlace, |c| OutputTarget::from(&c.output)),
			backup: config.is_some_and(|c| c.backup),
			roundtrips: config.map_or(0, |c| c.roundtrips),
			docs_dir,
			process: ProcessOptions {
				unterminated,
				max_depth: config.map_or(DEFAULT_MAX_DEPTH, |c| c.max_depth),
				timestamp: None,
			},
		}
	}
}

/// The outcome of processing one document.
#[derive(Debug, Clone)]
pub struct ProcessReport {
	/// The file the raw document was read from.
	pub source: PathBuf,
	/// The file the output was written to, if any.
	pub target: Option<PathBuf>,
	/// Where the previous target content was moved, if a backup was made.
	pub backup: Option<PathBuf>,
	/// The processed document.
	pub output: String,
	/// Time spent on the first parse.
	pub elapsed: Duration,
}

/// Load the project's metadata and process every configured document.
pub fn process_project(options: &ProjectOptions) -> MdonResult<Vec<ProcessReport>> {
	let metadata = load_metadata(&options.root, options.manifest.as_deref())?;

	options
		.documents
		.iter()
		.map(|document| process_document(options, &metadata, document))
		.collect()
}

/// Process a single document with a fresh context.
pub fn process_document(
	options: &ProjectOptions,
	metadata: &Map<String, Value>,
	document: &Path,
) -> MdonResult<ProcessReport> {
	let document_path = options.root.join(document);
	let docs_source = options.root.join(&options.docs_dir).join(document);
	let from_docs = docs_source.is_file();
	let source = if from_docs { docs_source } else { document_path.clone() };

	let target = output_path(&document_path, &options.output)?;
	let input = std::fs::read_to_string(&source)?;

	let mut context =
		Context::new(metadata.clone(), &options.root).with_options(options.process.clone());
	let started = Instant::now();
	let mut output = parse(&input, &mut context)?;
	let elapsed = started.elapsed();

	for pass in 0..options.roundtrips {
		tracing::debug!(pass = pass + 1, document = %document.display(), "roundtrip");
		output = parse(&output, &mut context)?;
	}

	if from_docs {
		output = comment_tags(&output).into_owned();
	}

	let backup = match &target {
		Some(target) => write_output(target, &output, options.backup)?,
		None => None,
	};

	tracing::info!(
		source = %source.display(),
		target = ?target.as_ref().map(|t| t.display().to_string()),
		links = context.link_table().len(),
		"processed document"
	);

	Ok(ProcessReport {
		source,
		target,
		backup,
		output,
		elapsed,
	})
}

/// The file that output for `document` is written to.
pub fn output_path(document: &Path, output: &OutputTarget) -> MdonResult<Option<PathBuf>> {
	match output {
		OutputTarget::InPlace => Ok(Some(document.to_path_buf())),
		OutputTarget::None => Ok(None),
		OutputTarget::Suffix(suffix) => suffixed_path(document, suffix).map(Some),
	}
}

/// Insert `suffix` before the extension of `document`, so `README.md` with
/// `.out` becomes `README.out.md`.
pub fn suffixed_path(document: &Path, suffix: &str) -> MdonResult<PathBuf> {
	if !SUFFIX.is_match(suffix) {
		return Err(MdonError::InvalidSuffix(suffix.to_string()));
	}

	let filename = document
		.file_name()
		.map(|name| name.to_string_lossy().into_owned())
		.unwrap_or_default();
	let stem = document
		.file_stem()
		.map(|stem| stem.to_string_lossy().into_owned())
		.unwrap_or_default();

	if stem.ends_with(suffix) || filename.ends_with(suffix) || filename.contains(&format!("{suffix}.")) {
		return Err(MdonError::AlreadySuffixed {
			filename,
			suffix: suffix.to_string(),
		});
	}

	let name = match document.extension() {
		Some(extension) => format!("{stem}{suffix}.{}", extension.to_string_lossy()),
		None => format!("{stem}{suffix}"),
	};

	Ok(document.with_file_name(name))
}

/// Write `contents` to `path`, first moving an existing file aside when
/// `backup` is set. Returns the backup location.
pub fn write_output(path: &Path, contents: &str, backup: bool) -> MdonResult<Option<PathBuf>> {
	let moved = if backup && path.exists() {
		let destination = backup_path(path);
		std::fs::rename(path, &destination)?;
		tracing::debug!(from = %path.display(), to = %destination.display(), "backed up");
		Some(destination)
	} else {
		None
	};

	std::fs::write(path, contents)?;
	Ok(moved)
}

/// The lowest free `<name>.<n>` next to `path`.
pub fn backup_path(path: &Path) -> PathBuf {
	let mut index = 0_usize;

	loop {
		let mut name = path.as_os_str().to_os_string();
		name.push(format!(".{index}"));
		let candidate = PathBuf::from(name);
		if !candidate.exists() {
			return candidate;
		}
		index += 1;
	}
}
