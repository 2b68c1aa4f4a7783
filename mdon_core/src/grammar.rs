//! Read-only pattern table for the directive syntax.
//!
//! Every pattern is compiled once and shared. Nothing here holds per-parse
//! state, so concurrent parses never observe each other.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

/// Expression that marks a directive (and its body) for removal.
pub const DISCARD: &str = "!";

/// Prefix used by `@alias` when the caller does not supply one.
pub const DEFAULT_ALIAS_PREFIX: &str = "link";

/// Raw opening tag line: `<? expression ?>`.
pub static OPEN_RAW: Lazy<Regex> =
	Lazy::new(|| compile(r"^<\?[ \t]*(.*?)[ \t]*\?>[ \t]*$"));

/// Commented opening tag line: `<!--? expression ?-->`.
pub static OPEN_COMMENTED: Lazy<Regex> =
	Lazy::new(|| compile(r"^<!--\?[ \t]*(.*?)[ \t]*\?-->[ \t]*$"));

/// Raw closing tag line: `<?!>`.
pub static CLOSE_RAW: Lazy<Regex> = Lazy::new(|| compile(r"^<\?!>[ \t]*$"));

/// Commented closing tag line: `<!--?!-->`.
pub static CLOSE_COMMENTED: Lazy<Regex> = Lazy::new(|| compile(r"^<!--\?!-->[ \t]*$"));

/// Alias tokens: lowercase words joined by single hyphens.
pub static ALIAS: Lazy<Regex> = Lazy::new(|| compile(r"^[a-z0-9]+(?:-[a-z0-9]+)*$"));

/// A complete property path such as `a.b[0]['c']`.
pub static PROPERTY_PATH: Lazy<Regex> = Lazy::new(|| {
	compile(r#"^\s*(\w+(?:\.\w+|\[\s*(?:\d+|'[^']*'|"[^"]*")\s*\])*)\s*$"#)
});

/// One segment after the head of a property path.
pub static PATH_SEGMENT: Lazy<Regex> = Lazy::new(|| {
	compile(r#"\.(\w+)|\[\s*(?:(\d+)|'([^']*)'|"([^"]*)")\s*\]"#)
});

/// `${path}` inside a template string.
pub static INTERPOLATION: Lazy<Regex> = Lazy::new(|| {
	compile(r#"\$\{\s*(\w+(?:\.\w+|\[\s*(?:\d+|'[^']*'|"[^"]*")\s*\])*)\s*\}"#)
});

/// A raw-form tag line, captured without its angle brackets.
pub static SHORT_TAG: Lazy<Regex> = Lazy::new(|| compile(r"(?m)^<(\?.*?[^-])>$"));

/// Output suffixes such as `.out`.
pub static SUFFIX: Lazy<Regex> = Lazy::new(|| compile(r"^\.\w+$"));

static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| compile(r"\r\n|\r"));
static EXTRANEOUS_LINE_BREAKS: Lazy<Regex> = Lazy::new(|| compile(r"\n(?:\s*\n)+"));

fn compile(pattern: &str) -> Regex {
	Regex::new(pattern).expect("grammar patterns are valid")
}

/// Reduce every line break to `\n` and collapse runs of blank lines into a
/// single blank line. Applying it twice yields the same text.
pub fn normalize_line_breaks(source: &str) -> String {
	let unified = LINE_BREAKS.replace_all(source, "\n");
	EXTRANEOUS_LINE_BREAKS
		.replace_all(&unified, "\n\n")
		.into_owned()
}

/// Trim and lowercase `value`, returning it only when it is a valid alias
/// token.
pub fn normalize_alias(value: &str) -> Option<String> {
	let value = value.trim().to_lowercase();
	ALIAS.is_match(&value).then_some(value)
}

/// Rewrite raw-form tag lines into the commented form so they stay hidden
/// when the document is rendered.
pub fn comment_tags(source: &str) -> Cow<'_, str> {
	SHORT_TAG.replace_all(source, "<!--${1}-->")
}
