use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum MdonError {
	#[error(transparent)]
	#[diagnostic(code(mdon::io_error))]
	Io(#[from] std::io::Error),

	#[error("unterminated directive `{expression}` opened on line {line}")]
	#[diagnostic(
		code(mdon::unterminated_directive),
		help("close the directive with `<?!>` (or `<!--?!-->` for the commented form)")
	)]
	UnterminatedDirective { expression: String, line: usize },

	#[error("syntax error in `{expression}` at offset {offset}: {reason}")]
	#[diagnostic(code(mdon::syntax))]
	Syntax {
		expression: String,
		offset: usize,
		reason: String,
	},

	#[error("{0} is not defined")]
	#[diagnostic(code(mdon::undefined_identifier))]
	UndefinedIdentifier(String),

	#[error("Cannot read property `{property}` of {target}")]
	#[diagnostic(code(mdon::undefined_property))]
	UndefinedProperty { property: String, target: String },

	#[error("unknown operation: `@{0}`")]
	#[diagnostic(
		code(mdon::unknown_operation),
		help("available operations: format, resolve, alias, ref, exists, include, parse, timestamp, links, exception")
	)]
	UnknownOperation(String),

	#[error("operation `@{0}` must be called, e.g. `@{0}(...)`")]
	#[diagnostic(code(mdon::uncalled_operation))]
	UncalledOperation(String),

	#[error("operation `@{name}` expects {expected} argument(s), got {got}")]
	#[diagnostic(code(mdon::invalid_arguments))]
	InvalidArguments {
		name: String,
		expected: String,
		got: usize,
	},

	#[error("Cannot create alias from reference: {0}")]
	#[diagnostic(code(mdon::blank_reference))]
	BlankReference(String),

	#[error("Cannot create alias from reference: {reference} with prefix: {prefix}")]
	#[diagnostic(
		code(mdon::invalid_prefix),
		help("alias prefixes are lowercase `[a-z0-9]` words joined by single hyphens")
	)]
	InvalidPrefix { reference: String, prefix: String },

	#[error("Cannot create reference from alias: {0}")]
	#[diagnostic(code(mdon::invalid_alias))]
	InvalidAlias(String),

	#[error("Cannot find reference from alias {0}.")]
	#[diagnostic(code(mdon::unknown_alias))]
	UnknownAlias(String),

	#[error("Cannot resolve `{0}` relative to the document")]
	#[diagnostic(code(mdon::unresolved))]
	Unresolved(String),

	#[error("include cycle detected: `{0}` is already being included")]
	#[diagnostic(code(mdon::include_cycle))]
	IncludeCycle(String),

	#[error("nested parse depth exceeded the limit of {0}")]
	#[diagnostic(
		code(mdon::recursion_limit),
		help("raise `max_depth` in mdon.toml or pass `--max-depth`")
	)]
	RecursionLimit(usize),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(mdon::config_parse),
		help("check that mdon.toml is valid TOML")
	)]
	ConfigParse(String),

	#[error("failed to load metadata file `{path}`: {reason}")]
	#[diagnostic(code(mdon::metadata_file))]
	MetadataFile { path: String, reason: String },

	#[error("unsupported metadata file format: `{0}`")]
	#[diagnostic(
		code(mdon::unsupported_format),
		help("supported formats: json, toml, yaml, yml")
	)]
	UnsupportedMetadataFormat(String),

	#[error("the suffix `{0}` is unsupported")]
	#[diagnostic(
		code(mdon::invalid_suffix),
		help("suffixes start with a `.` and contain only word characters, e.g. `.out`")
	)]
	InvalidSuffix(String),

	#[error("cannot process `{filename}` because it already includes the suffix `{suffix}`")]
	#[diagnostic(code(mdon::already_suffixed))]
	AlreadySuffixed { filename: String, suffix: String },
}

pub type MdonResult<T> = Result<T, MdonError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
