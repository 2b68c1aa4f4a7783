use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use mdon_cli::MdonCli;
use mdon_core::MdonConfig;
use mdon_core::OutputTarget;
use mdon_core::ProjectOptions;
use mdon_core::Unterminated;
use mdon_core::load_metadata;
use mdon_core::output_path;
use mdon_core::process_document;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

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
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,dimmed) => {
		if color_enabled() {
			format!("{}", $text.dimmed())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = MdonCli::parse();

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

	if let Err(e) = run(&args) {
		match e.downcast::<mdon_core::MdonError>() {
			Ok(mdon_err) => {
				let report: miette::Report = (*mdon_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Logs go to stderr so processed output on stdout stays clean. `RUST_LOG`
/// overrides the level chosen by `--verbose`.
fn init_tracing(verbose: bool, use_color: bool) {
	let level = if verbose { "debug" } else { "warn" };

	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
		.with_ansi(use_color)
		.with_target(false)
		.with_writer(std::io::stderr)
		.init();
}

fn resolve_root(args: &MdonCli) -> PathBuf {
	args.root
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Build the project options from `mdon.toml`, then let flags override it.
fn resolve_options(args: &MdonCli, root: &Path) -> Result<ProjectOptions, Box<dyn std::error::Error>> {
	let config = MdonConfig::load(root)?;
	let mut options = ProjectOptions::from_config(root, config.as_ref());

	if !args.documents.is_empty() {
		options.documents.clone_from(&args.documents);
	}
	if let Some(suffix) = &args.suffix {
		options.output = OutputTarget::Suffix(suffix.clone());
	}
	if args.backup {
		options.backup = true;
	}
	if let Some(roundtrips) = args.roundtrips {
		options.roundtrips = roundtrips;
	}
	if args.strict {
		options.process.unterminated = Unterminated::Reject;
	}
	if let Some(max_depth) = args.max_depth {
		options.process.max_depth = max_depth;
	}

	Ok(options)
}

fn run(args: &MdonCli) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let mut options = resolve_options(args, &root)?;
	let metadata = load_metadata(&root, options.manifest.as_deref())?;

	// Diffs compare against the file that would be written, even on a dry run.
	let configured_output = options.output.clone();
	if args.dry_run {
		options.output = OutputTarget::None;
	}

	for document in &options.documents {
		let document_path = root.join(document);
		let destination =
			output_path(&document_path, &configured_output)?.unwrap_or_else(|| document_path.clone());
		let previous = if args.diff {
			std::fs::read_to_string(&destination).unwrap_or_default()
		} else {
			String::new()
		};

		let report = process_document(&options, &metadata, document)?;
		let elapsed = report.elapsed.as_secs_f64() * 1000.0;
		let shown = report.target.as_deref().unwrap_or(&destination);

		println!(
			"{} {} done in {elapsed:.1} ms",
			colored!("mdon:", green),
			make_relative(shown, &root)
		);

		if let Some(backup) = &report.backup {
			println!("  backed up to {}", make_relative(backup, &root));
		}

		if args.diff {
			if previous == report.output {
				println!("  {}", colored!("no changes", dimmed));
			} else {
				print_diff(&previous, &report.output);
			}
		}

		if args.preview {
			print_preview(&make_relative(shown, &root), &report.output);
		} else if args.dry_run && !args.diff {
			print!("{}", report.output);
		}
	}

	Ok(())
}

/// Print a unified diff between two strings, colorized.
fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				print!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				print!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				print!("   {change}");
			}
		}
		if change.missing_newline() {
			println!();
		}
	}
}

/// Print `content` framed with line numbers.
fn print_preview(title: &str, content: &str) {
	let width = content.lines().count().to_string().len();
	println!("{}", colored!(format!("┌─ {title}"), bold));
	for (index, line) in content.lines().enumerate() {
		let number = format!("{:>width$} │", index + 1);
		println!("{} {line}", colored!(number, dimmed));
	}
	println!("{}", colored!("└─", bold));
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
