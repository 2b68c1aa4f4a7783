use serde::Deserialize;
use serde::Serialize;

use crate::MdonResult;
use crate::context::Capabilities;
use crate::context::Context;
use crate::evaluator::evaluate_source;
use crate::fragments::Directive;
use crate::fragments::Fragment;
use crate::fragments::TagForm;
use crate::fragments::Unterminated;
use crate::fragments::split;
use crate::grammar::DISCARD;
use crate::grammar::normalize_line_breaks;

/// Nested `@parse` and `@include` calls allowed before evaluation gives up.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Knobs for a single parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOptions {
	/// Handling of opening tags without a closing tag.
	pub unterminated: Unterminated,
	/// Limit for nested parses.
	pub max_depth: usize,
	/// Fixed "Last Updated" text. The current UTC time is used when unset.
	pub timestamp: Option<String>,
}

impl Default for ProcessOptions {
	fn default() -> Self {
		Self {
			unterminated: Unterminated::default(),
			max_depth: DEFAULT_MAX_DEPTH,
			timestamp: None,
		}
	}
}

/// Process a complete document: evaluate every directive, append the link
/// footer and normalize line breaks.
///
/// Parsing the output again with a context in the same state yields the
/// same text.
pub fn parse(source: &str, context: &mut Context) -> MdonResult<String> {
	render(source, context, true)
}

/// Process a fragment of a document. Identical to [`parse`] except that no
/// footer is appended.
pub(crate) fn parse_nested(source: &str, context: &mut Context) -> MdonResult<String> {
	render(source, context, false)
}

fn render(source: &str, context: &mut Context, root: bool) -> MdonResult<String> {
	let normalized = normalize_line_breaks(source);
	let fragments = split(&normalized, context.options().unterminated)?;
	tracing::trace!(fragments = fragments.len(), root, "split document");

	let mut output = String::with_capacity(normalized.len());
	for fragment in &fragments {
		match fragment {
			Fragment::Text(text) => output.push_str(text),
			Fragment::Directive(directive) => output.push_str(&render_directive(directive, context)),
		}
	}

	if root {
		output.push_str(&footer(context));
	}

	Ok(normalize_line_breaks(&output))
}

/// Produce the replacement text for one envelope.
///
/// Evaluation errors never escape. They are rendered into the body as an
/// inline comment so the rest of the document still gets processed.
pub fn render_directive<C: Capabilities>(directive: &Directive, context: &mut C) -> String {
	if directive.is_literal() {
		return directive.raw.clone();
	}

	if directive.is_discard() {
		return "\n".to_string();
	}

	let body = match evaluate_source(&directive.expression, context) {
		Ok(value) => {
			tracing::debug!(
				expression = %directive.expression,
				line = directive.line,
				"evaluated directive"
			);
			format!("\n{}\n", context.format(&value))
		}
		Err(error) => {
			tracing::warn!(
				expression = %directive.expression,
				line = directive.line,
				"directive failed: {error}"
			);
			format_exception(&error.to_string())
		}
	};

	directive.form.wrap(&directive.expression, &body)
}

/// Render an error message as a directive body.
pub fn format_exception(message: &str) -> String {
	let message = message.trim();
	let message = if message.is_empty() { "FAILED!" } else { message };
	format!("\n<!-- `{}` -->\n", separate_dashes(message))
}

/// Put a space after every dash that is followed by another dash, so no run
/// of dashes can end the surrounding comment.
fn separate_dashes(message: &str) -> String {
	let mut separated = String::with_capacity(message.len());
	let mut chars = message.chars().peekable();

	while let Some(ch) = chars.next() {
		separated.push(ch);
		if ch == '-' && chars.peek() == Some(&'-') {
			separated.push(' ');
		}
	}

	separated
}

/// The discardable footer block holding link definitions and the update
/// stamp.
pub fn footer<C: Capabilities>(context: &C) -> String {
	format!(
		"\n\n{}\n{}\n---\nLast Updated: {}\n{}\n",
		TagForm::Raw.open(DISCARD),
		context.links(),
		context.timestamp(),
		TagForm::Raw.close(),
	)
}
