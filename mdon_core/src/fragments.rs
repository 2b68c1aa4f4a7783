use serde::Deserialize;
use serde::Serialize;

use crate::MdonError;
use crate::MdonResult;
use crate::grammar::CLOSE_COMMENTED;
use crate::grammar::CLOSE_RAW;
use crate::grammar::DISCARD;
use crate::grammar::OPEN_COMMENTED;
use crate::grammar::OPEN_RAW;

/// The two interchangeable surface syntaxes of a directive envelope.
///
/// ```md
/// <? @alias('./other.md') ?>
/// body
/// <?!>
///
/// <!--? @alias('./other.md') ?-->
/// body
/// <!--?!-->
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagForm {
	/// `<? expression ?>` … `<?!>`
	Raw,
	/// `<!--? expression ?-->` … `<!--?!-->`
	Commented,
}

impl TagForm {
	pub fn open(self, expression: &str) -> String {
		match self {
			Self::Raw => format!("<? {expression} ?>"),
			Self::Commented => format!("<!--? {expression} ?-->"),
		}
	}

	pub fn close(self) -> &'static str {
		match self {
			Self::Raw => "<?!>",
			Self::Commented => "<!--?!-->",
		}
	}

	/// Wrap `body` in an envelope of this form echoing `expression`.
	pub fn wrap(self, expression: &str, body: &str) -> String {
		format!("{}{body}{}", self.open(expression), self.close())
	}

	fn closes(self, line: &str) -> bool {
		match self {
			Self::Raw => CLOSE_RAW.is_match(line),
			Self::Commented => CLOSE_COMMENTED.is_match(line),
		}
	}
}

/// One directive envelope taken from a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
	/// The exact source of the envelope, from the opening tag to the end of
	/// the closing tag.
	pub raw: String,
	/// The control text between the opening markers, trimmed.
	pub expression: String,
	/// Everything between the opening tag and the closing tag line, including
	/// the line break that ends the opening tag.
	pub body: String,
	/// Which surface syntax the envelope used.
	pub form: TagForm,
	/// 1-indexed line of the opening tag.
	pub line: usize,
	/// False when the closing tag was missing and the body ran to the end of
	/// the document.
	pub terminated: bool,
}

impl Directive {
	pub fn is_discard(&self) -> bool {
		self.expression == DISCARD
	}

	/// An envelope without an expression is literal text.
	pub fn is_literal(&self) -> bool {
		self.expression.is_empty()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(variant_size_differences)]
pub enum Fragment {
	Text(String),
	Directive(Directive),
}

impl Fragment {
	/// The span of source text this fragment was split from.
	pub fn raw(&self) -> &str {
		match self {
			Self::Text(text) => text,
			Self::Directive(directive) => &directive.raw,
		}
	}
}

/// What to do with an opening tag whose closing tag never arrives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unterminated {
	/// Swallow the rest of the document into the directive body.
	#[default]
	Absorb,
	/// Fail the parse with [`MdonError::UnterminatedDirective`].
	Reject,
}

struct Line<'a> {
	start: usize,
	content: &'a str,
}

impl Line<'_> {
	fn end(&self) -> usize {
		self.start + self.content.len()
	}
}

fn lines(source: &str) -> Vec<Line<'_>> {
	let mut lines = Vec::new();
	let mut start = 0;

	for segment in source.split_inclusive('\n') {
		lines.push(Line {
			start,
			content: segment.strip_suffix('\n').unwrap_or(segment),
		});
		start += segment.len();
	}

	lines
}

fn match_open(line: &str) -> Option<(TagForm, String)> {
	if let Some(captures) = OPEN_RAW.captures(line) {
		return Some((TagForm::Raw, captures[1].to_string()));
	}

	OPEN_COMMENTED
		.captures(line)
		.map(|captures| (TagForm::Commented, captures[1].to_string()))
}

/// The line closing the envelope opened at `open_index`.
///
/// Openers of the same form inside the body nest, so an envelope rendered by
/// `@include` or `@parse` keeps its own closing tag. When the nesting never
/// balances, the first closing tag of the form ends the body.
fn find_close(lines: &[Line<'_>], open_index: usize, form: TagForm) -> Option<usize> {
	let mut depth = 0usize;
	let mut first = None;

	for (index, line) in lines.iter().enumerate().skip(open_index + 1) {
		if form.closes(line.content) {
			if depth == 0 {
				return Some(index);
			}
			first.get_or_insert(index);
			depth -= 1;
		} else if matches!(match_open(line.content), Some((inner, _)) if inner == form) {
			depth += 1;
		}
	}

	first
}

/// Split normalized source into literal text and directive envelopes, in
/// document order. Joining the [`Fragment::raw`] spans reproduces `source`.
///
/// Opening and closing tags must each occupy a whole line. Envelopes of the
/// same form may nest inside a body.
pub fn split(source: &str, unterminated: Unterminated) -> MdonResult<Vec<Fragment>> {
	let lines = lines(source);
	let mut fragments = Vec::new();
	let mut text_start = 0;
	let mut index = 0;

	while index < lines.len() {
		let open = &lines[index];
		let Some((form, expression)) = match_open(open.content) else {
			index += 1;
			continue;
		};

		let close = find_close(&lines, index, form);

		if open.start > text_start {
			fragments.push(Fragment::Text(source[text_start..open.start].to_string()));
		}

		let Some(close_index) = close else {
			if unterminated == Unterminated::Reject {
				return Err(MdonError::UnterminatedDirective {
					expression,
					line: index + 1,
				});
			}

			fragments.push(Fragment::Directive(Directive {
				raw: source[open.start..].to_string(),
				expression,
				body: source[open.end()..].to_string(),
				form,
				line: index + 1,
				terminated: false,
			}));
			text_start = source.len();
			break;
		};

		let close = &lines[close_index];
		fragments.push(Fragment::Directive(Directive {
			raw: source[open.start..close.end()].to_string(),
			expression,
			body: source[open.end()..close.start].to_string(),
			form,
			line: index + 1,
			terminated: true,
		}));
		text_start = close.end();
		index = close_index + 1;
	}

	if text_start < source.len() {
		fragments.push(Fragment::Text(source[text_start..].to_string()));
	}

	Ok(fragments)
}

/// Returns true when `source` holds at least one complete envelope.
pub fn has_directives(source: &str) -> bool {
	split(source, Unterminated::Absorb).is_ok_and(|fragments| {
		fragments.iter().any(|fragment| {
			matches!(fragment, Fragment::Directive(directive) if directive.terminated)
		})
	})
}
