use std::fmt::Display;
use std::ops::Range;

/// Tokens of a directive expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
	/// `@name`, a call into the context's operations.
	Operation(String),
	/// `{{ path }}`, holding the path text between the braces.
	Property(String),
	/// A bare identifier, e.g. `this` or `true`.
	Ident(String),
	/// A numeric literal, e.g. `42` or `1.5`.
	Number(f64),
	/// A quoted string with escapes already applied, and its delimiter.
	String(String, u8),
	/// The unprocessed text between the backticks of a template string.
	Template(String),
	/// `.`
	Dot,
	/// `[`
	BracketOpen,
	/// `]`
	BracketClose,
	/// `(`
	ParenOpen,
	/// `)`
	ParenClose,
	/// `,`
	Comma,
	/// `+`
	Plus,
	/// `||`
	Or,
	/// `&&`
	And,
	/// `!`
	Bang,
}

impl Display for Token {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Token::Operation(name) => write!(f, "@{name}"),
			Token::Property(path) => write!(f, "{{{{{path}}}}}"),
			Token::Ident(ident) => write!(f, "{ident}"),
			Token::Number(number) => write!(f, "{number}"),
			Token::String(string, ch) => {
				let ch = *ch as char;
				write!(f, "{ch}{string}{ch}")
			}
			Token::Template(raw) => write!(f, "`{raw}`"),
			Token::Dot => write!(f, "."),
			Token::BracketOpen => write!(f, "["),
			Token::BracketClose => write!(f, "]"),
			Token::ParenOpen => write!(f, "("),
			Token::ParenClose => write!(f, ")"),
			Token::Comma => write!(f, ","),
			Token::Plus => write!(f, "+"),
			Token::Or => write!(f, "||"),
			Token::And => write!(f, "&&"),
			Token::Bang => write!(f, "!"),
		}
	}
}

/// A token with the byte range it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
	pub token: Token,
	pub span: Range<usize>,
}
