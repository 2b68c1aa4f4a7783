use logos::Logos;
use snailquote::unescape;

use crate::MdonError;
use crate::MdonResult;
use crate::tokens::SpannedToken;
use crate::tokens::Token;

/// Raw tokens produced by logos for a directive expression.
#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum RawToken {
	#[regex(r"@[A-Za-z_][A-Za-z0-9_]*")]
	Operation,
	#[regex(r"\{\{[^{}]*\}\}")]
	Property,
	#[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
	Ident,
	#[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
	Number,
	#[regex(r#""([^"\\]|\\.)*""#)]
	DoubleQuotedString,
	#[regex(r"'([^'\\]|\\.)*'")]
	SingleQuotedString,
	#[regex(r"`([^`\\]|\\.)*`")]
	Template,
	#[token(".")]
	Dot,
	#[token("[")]
	BracketOpen,
	#[token("]")]
	BracketClose,
	#[token("(")]
	ParenOpen,
	#[token(")")]
	ParenClose,
	#[token(",")]
	Comma,
	#[token("+")]
	Plus,
	#[token("||")]
	Or,
	#[token("&&")]
	And,
	#[token("!")]
	Bang,
}

/// Apply backslash escapes to the text of a quoted literal, without its
/// delimiters. The text is re-quoted as a double-quoted shell word so that
/// `snailquote` handles the escape table.
pub(crate) fn unescape_literal(inner: &str) -> Option<String> {
	if !inner.contains('\\') {
		return Some(inner.to_string());
	}

	let mut quoted = String::with_capacity(inner.len() + 2);
	quoted.push('"');
	let mut chars = inner.chars();
	while let Some(ch) = chars.next() {
		match ch {
			'\\' => {
				quoted.push('\\');
				quoted.push(chars.next()?);
			}
			'"' => quoted.push_str("\\\""),
			other => quoted.push(other),
		}
	}
	quoted.push('"');

	unescape(&quoted).ok()
}

/// Tokenize a directive expression.
pub fn tokenize(expression: &str) -> MdonResult<Vec<SpannedToken>> {
	let mut tokens = Vec::new();

	for (result, span) in RawToken::lexer(expression).spanned() {
		let slice = &expression[span.clone()];
		let syntax_error = |reason: String| {
			MdonError::Syntax {
				expression: expression.to_string(),
				offset: span.start,
				reason,
			}
		};

		let Ok(raw) = result else {
			return Err(syntax_error(format!("unexpected character `{slice}`")));
		};

		let token = match raw {
			RawToken::Operation => Token::Operation(slice[1..].to_string()),
			RawToken::Property => Token::Property(slice[2..slice.len() - 2].to_string()),
			RawToken::Ident => Token::Ident(slice.to_string()),
			RawToken::Number => {
				let value = slice
					.parse::<f64>()
					.map_err(|e| syntax_error(e.to_string()))?;
				Token::Number(value)
			}
			RawToken::DoubleQuotedString | RawToken::SingleQuotedString => {
				let delimiter = slice.as_bytes()[0];
				let value = unescape_literal(&slice[1..slice.len() - 1])
					.ok_or_else(|| syntax_error("invalid escape sequence".to_string()))?;
				Token::String(value, delimiter)
			}
			RawToken::Template => Token::Template(slice[1..slice.len() - 1].to_string()),
			RawToken::Dot => Token::Dot,
			RawToken::BracketOpen => Token::BracketOpen,
			RawToken::BracketClose => Token::BracketClose,
			RawToken::ParenOpen => Token::ParenOpen,
			RawToken::ParenClose => Token::ParenClose,
			RawToken::Comma => Token::Comma,
			RawToken::Plus => Token::Plus,
			RawToken::Or => Token::Or,
			RawToken::And => Token::And,
			RawToken::Bang => Token::Bang,
		};

		tokens.push(SpannedToken { token, span });
	}

	Ok(tokens)
}
