use std::fmt::Display;

use derive_more::Deref;
use serde_json::Value;

use crate::MdonError;
use crate::MdonResult;
use crate::grammar::INTERPOLATION;
use crate::grammar::PATH_SEGMENT;
use crate::grammar::PROPERTY_PATH;
use crate::lexer::tokenize;
use crate::lexer::unescape_literal;
use crate::tokens::SpannedToken;
use crate::tokens::Token;

/// One step of a property path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
	/// `.name` or `['name']`
	Key(String),
	/// `[0]`
	Index(usize),
}

/// A dotted and bracketed property path such as `repository.urls[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Deref)]
pub struct PropertyPath(Vec<Segment>);

impl PropertyPath {
	/// Parse path text, returning `None` if it does not follow the path
	/// grammar.
	pub fn parse(text: &str) -> Option<Self> {
		let captures = PROPERTY_PATH.captures(text)?;
		let path = captures.get(1)?.as_str();
		let head_len = path
			.find(|ch: char| ch == '.' || ch == '[')
			.unwrap_or(path.len());
		let mut segments = vec![Segment::Key(path[..head_len].to_string())];

		for segment in PATH_SEGMENT.captures_iter(&path[head_len..]) {
			if let Some(name) = segment.get(1).or(segment.get(3)).or(segment.get(4)) {
				segments.push(Segment::Key(name.as_str().to_string()));
			} else if let Some(index) = segment.get(2) {
				segments.push(Segment::Index(index.as_str().parse().ok()?));
			}
		}

		Some(Self(segments))
	}
}

impl Display for PropertyPath {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		for (index, segment) in self.0.iter().enumerate() {
			match segment {
				Segment::Key(key) if index == 0 => write!(f, "{key}")?,
				Segment::Key(key) => write!(f, ".{key}")?,
				Segment::Index(position) => write!(f, "[{position}]")?,
			}
		}
		Ok(())
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
	Text(String),
	/// `${path}`, rendered through the context's formatter.
	Interpolation(PropertyPath),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Accessor {
	/// `.name`
	Name(String),
	/// `[expression]`
	Computed(Box<Expression>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
	Add,
	Or,
	And,
}

/// The syntax tree of a directive expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
	Literal(Value),
	Template(Vec<TemplatePart>),
	/// `{{ path }}`
	Property(PropertyPath),
	/// `this`, the context itself.
	This,
	/// Any other bare name. Evaluating it always fails.
	Identifier(String),
	/// `@name` with its arguments, or `None` when it is not called.
	Operation {
		name: String,
		arguments: Option<Vec<Expression>>,
	},
	Member {
		object: Box<Expression>,
		accessor: Accessor,
	},
	Not(Box<Expression>),
	Binary {
		operator: BinaryOperator,
		left: Box<Expression>,
		right: Box<Expression>,
	},
}

/// Parse the text of a directive expression.
pub fn parse_expression(source: &str) -> MdonResult<Expression> {
	let tokens = tokenize(source)?;
	let mut parser = ExpressionParser {
		source,
		tokens,
		cursor: 0,
	};

	let expression = parser.parse_or()?;
	if let Some(token) = parser.tokens.get(parser.cursor) {
		return Err(parser.error_at(token.span.start, format!("unexpected `{}`", token.token)));
	}

	Ok(expression)
}

/// Split the inside of a template string into text and `${path}` parts.
pub fn parse_template(raw: &str) -> Option<Vec<TemplatePart>> {
	let mut parts = Vec::new();
	let mut last = 0;

	for captures in INTERPOLATION.captures_iter(raw) {
		let whole = captures.get(0)?;
		if whole.start() > last {
			parts.push(TemplatePart::Text(unescape_literal(&raw[last..whole.start()])?));
		}
		parts.push(TemplatePart::Interpolation(PropertyPath::parse(
			captures.get(1)?.as_str(),
		)?));
		last = whole.end();
	}

	if last < raw.len() {
		parts.push(TemplatePart::Text(unescape_literal(&raw[last..])?));
	}

	Some(parts)
}

struct ExpressionParser<'a> {
	source: &'a str,
	tokens: Vec<SpannedToken>,
	cursor: usize,
}

impl ExpressionParser<'_> {
	fn error_at(&self, offset: usize, reason: String) -> MdonError {
		MdonError::Syntax {
			expression: self.source.to_string(),
			offset,
			reason,
		}
	}

	fn peek(&self) -> Option<&Token> {
		self.tokens.get(self.cursor).map(|spanned| &spanned.token)
	}

	fn advance(&mut self) -> Option<SpannedToken> {
		let token = self.tokens.get(self.cursor).cloned();
		if token.is_some() {
			self.cursor += 1;
		}
		token
	}

	fn eat(&mut self, expected: &Token) -> bool {
		if self.peek() == Some(expected) {
			self.cursor += 1;
			true
		} else {
			false
		}
	}

	fn expect(&mut self, expected: &Token) -> MdonResult<()> {
		if self.eat(expected) {
			return Ok(());
		}

		Err(match self.tokens.get(self.cursor) {
			Some(found) => {
				self.error_at(
					found.span.start,
					format!("expected `{expected}`, found `{}`", found.token),
				)
			}
			None => {
				self.error_at(
					self.source.len(),
					format!("expected `{expected}` before the end of the expression"),
				)
			}
		})
	}

	fn parse_or(&mut self) -> MdonResult<Expression> {
		let mut left = self.parse_and()?;
		while self.eat(&Token::Or) {
			let right = self.parse_and()?;
			left = binary(BinaryOperator::Or, left, right);
		}
		Ok(left)
	}

	fn parse_and(&mut self) -> MdonResult<Expression> {
		let mut left = self.parse_additive()?;
		while self.eat(&Token::And) {
			let right = self.parse_additive()?;
			left = binary(BinaryOperator::And, left, right);
		}
		Ok(left)
	}

	fn parse_additive(&mut self) -> MdonResult<Expression> {
		let mut left = self.parse_unary()?;
		while self.eat(&Token::Plus) {
			let right = self.parse_unary()?;
			left = binary(BinaryOperator::Add, left, right);
		}
		Ok(left)
	}

	fn parse_unary(&mut self) -> MdonResult<Expression> {
		if self.eat(&Token::Bang) {
			return Ok(Expression::Not(Box::new(self.parse_unary()?)));
		}
		self.parse_postfix()
	}

	fn parse_postfix(&mut self) -> MdonResult<Expression> {
		let mut expression = self.parse_primary()?;

		loop {
			if self.eat(&Token::Dot) {
				let Some(SpannedToken {
					token: Token::Ident(name),
					..
				}) = self.advance()
				else {
					return Err(self.error_at(
						self.offset(),
						"expected a property name after `.`".to_string(),
					));
				};
				expression = Expression::Member {
					object: Box::new(expression),
					accessor: Accessor::Name(name),
				};
			} else if self.eat(&Token::BracketOpen) {
				let index = self.parse_or()?;
				self.expect(&Token::BracketClose)?;
				expression = Expression::Member {
					object: Box::new(expression),
					accessor: Accessor::Computed(Box::new(index)),
				};
			} else {
				return Ok(expression);
			}
		}
	}

	fn parse_arguments(&mut self) -> MdonResult<Vec<Expression>> {
		let mut arguments = Vec::new();
		if self.eat(&Token::ParenClose) {
			return Ok(arguments);
		}

		loop {
			arguments.push(self.parse_or()?);
			if self.eat(&Token::Comma) {
				continue;
			}
			self.expect(&Token::ParenClose)?;
			return Ok(arguments);
		}
	}

	fn parse_primary(&mut self) -> MdonResult<Expression> {
		let Some(SpannedToken { token, span }) = self.advance() else {
			return Err(self.error_at(
				self.source.len(),
				"unexpected end of the expression".to_string(),
			));
		};

		let expression = match token {
			Token::Number(number) => {
				Expression::Literal(
					serde_json::Number::from_f64(number).map_or(Value::Null, Value::Number),
				)
			}
			Token::String(value, _) => Expression::Literal(Value::String(value)),
			Token::Template(raw) => {
				let parts = parse_template(&raw)
					.ok_or_else(|| self.error_at(span.start, "invalid template string".to_string()))?;
				Expression::Template(parts)
			}
			Token::Property(text) => {
				let path = PropertyPath::parse(&text).ok_or_else(|| {
					self.error_at(span.start, format!("invalid property path `{}`", text.trim()))
				})?;
				Expression::Property(path)
			}
			Token::Operation(name) => {
				let arguments = if self.eat(&Token::ParenOpen) {
					Some(self.parse_arguments()?)
				} else {
					None
				};
				Expression::Operation { name, arguments }
			}
			Token::Ident(ident) => {
				match ident.as_str() {
					"this" => Expression::This,
					"true" => Expression::Literal(Value::Bool(true)),
					"false" => Expression::Literal(Value::Bool(false)),
					"null" => Expression::Literal(Value::Null),
					_ => Expression::Identifier(ident),
				}
			}
			Token::ParenOpen => {
				let inner = self.parse_or()?;
				self.expect(&Token::ParenClose)?;
				inner
			}
			other => return Err(self.error_at(span.start, format!("unexpected `{other}`"))),
		};

		Ok(expression)
	}

	fn offset(&self) -> usize {
		self.tokens
			.get(self.cursor)
			.map_or(self.source.len(), |token| token.span.start)
	}
}

fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
	Expression::Binary {
		operator,
		left: Box::new(left),
		right: Box::new(right),
	}
}
