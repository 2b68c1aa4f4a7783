use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Regenerate directive sections in markdown documents.",
	long_about = "mdon evaluates `<? expression ?>` directives embedded in markdown against your \
	              project metadata and rewrites the body of each one.\n\nThe output is a fixed \
	              point: running mdon again over a processed document changes nothing.\n\nQuick \
	              start:\n  mdon              Process README.md in the current directory\n  mdon \
	              . GUIDE.md    Process GUIDE.md\n  mdon --dry-run    Print the result instead \
	              of writing it"
)]
#[allow(clippy::struct_excessive_bools)]
pub struct MdonCli {
	/// Path to the project root directory. Documents, the manifest and
	/// includes resolve against it.
	pub root: Option<PathBuf>,

	/// Documents to process, relative to the root. Defaults to the
	/// `documents` list in `mdon.toml`, or `README.md`.
	pub documents: Vec<PathBuf>,

	/// Write `<name><suffix>.<ext>` next to each document instead of
	/// overwriting it, e.g. `--suffix .out`.
	#[arg(long)]
	pub suffix: Option<String>,

	/// Process documents without writing anything.
	#[arg(long, default_value_t = false)]
	pub dry_run: bool,

	/// Move an existing output file to `<name>.<n>` before overwriting it.
	#[arg(long, default_value_t = false)]
	pub backup: bool,

	/// Print each processed document with line numbers.
	#[arg(long, default_value_t = false)]
	pub preview: bool,

	/// Show a unified diff between the current output file and the new
	/// content.
	#[arg(long, default_value_t = false)]
	pub diff: bool,

	/// Re-process the output this many extra times.
	#[arg(long)]
	pub roundtrips: Option<usize>,

	/// Fail on directives that are never closed instead of absorbing the
	/// rest of the document.
	#[arg(long, default_value_t = false)]
	pub strict: bool,

	/// Maximum depth of nested `@include` and `@parse` calls.
	#[arg(long)]
	pub max_depth: Option<usize>,

	/// Enable verbose output.
	#[arg(long, short, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, default_value_t = false)]
	pub no_color: bool,
}
