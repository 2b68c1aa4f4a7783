use serde_json::Value;

use crate::MdonError;
use crate::MdonResult;
use crate::context::Capabilities;
use crate::context::display_value;
use crate::engine::format_exception;
use crate::expression::Accessor;
use crate::expression::BinaryOperator;
use crate::expression::Expression;
use crate::expression::PropertyPath;
use crate::expression::Segment;
use crate::expression::TemplatePart;
use crate::expression::parse_expression;
use crate::grammar::DEFAULT_ALIAS_PREFIX;

/// Every name callable as `@name(...)`.
pub const OPERATIONS: [&str; 10] = [
	"format",
	"resolve",
	"alias",
	"ref",
	"exists",
	"include",
	"parse",
	"timestamp",
	"links",
	"exception",
];

/// Parse and evaluate the expression of a directive.
pub fn evaluate_source<C: Capabilities>(source: &str, context: &mut C) -> MdonResult<Value> {
	let expression = parse_expression(source)?;
	evaluate(&expression, context)
}

/// Evaluate an expression against the context's properties and operations.
pub fn evaluate<C: Capabilities>(expression: &Expression, context: &mut C) -> MdonResult<Value> {
	match expression {
		Expression::Literal(value) => Ok(value.clone()),
		Expression::Template(parts) => {
			let mut rendered = String::new();
			for part in parts {
				match part {
					TemplatePart::Text(text) => rendered.push_str(text),
					TemplatePart::Interpolation(path) => {
						let value = lookup(context, path)?;
						rendered.push_str(&context.format(&value));
					}
				}
			}
			Ok(Value::String(rendered))
		}
		Expression::Property(path) => lookup(context, path),
		Expression::This => Ok(context.snapshot()),
		Expression::Identifier(name) => Err(MdonError::UndefinedIdentifier(name.clone())),
		Expression::Operation { name, arguments } => {
			let Some(arguments) = arguments else {
				return Err(if OPERATIONS.contains(&name.as_str()) {
					MdonError::UncalledOperation(name.clone())
				} else {
					MdonError::UnknownOperation(name.clone())
				});
			};

			let mut values = Vec::with_capacity(arguments.len());
			for argument in arguments {
				values.push(evaluate(argument, context)?);
			}
			invoke(context, name, values)
		}
		Expression::Member { object, accessor } => {
			let target = evaluate(object, context)?;
			let segment = match accessor {
				Accessor::Name(name) => Segment::Key(name.clone()),
				Accessor::Computed(index) => {
					match evaluate(index, context)? {
						Value::Number(number) => {
							match number.as_f64() {
								Some(float) if float >= 0.0 && float.fract() == 0.0 => {
									Segment::Index(float as usize)
								}
								_ => Segment::Key(display_value(&Value::Number(number))),
							}
						}
						other => Segment::Key(display_value(&other)),
					}
				}
			};
			let description = kind(&target).to_string();
			access(target, &segment, &description)
		}
		Expression::Not(inner) => Ok(Value::Bool(!truthy(&evaluate(inner, context)?))),
		Expression::Binary {
			operator,
			left,
			right,
		} => {
			let left = evaluate(left, context)?;
			match operator {
				BinaryOperator::Or if truthy(&left) => Ok(left),
				BinaryOperator::And if !truthy(&left) => Ok(left),
				BinaryOperator::Or | BinaryOperator::And => evaluate(right, context),
				BinaryOperator::Add => {
					let right = evaluate(right, context)?;
					Ok(add(&left, &right))
				}
			}
		}
	}
}

/// JavaScript-like truthiness: `null`, `false`, `0` and `""` are false.
pub fn truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(boolean) => *boolean,
		Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
		Value::String(string) => !string.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}

fn add(left: &Value, right: &Value) -> Value {
	if let (Value::Number(a), Value::Number(b)) = (left, right) {
		if let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) {
			if let Some(sum) = serde_json::Number::from_f64(a + b) {
				return Value::Number(sum);
			}
		}
	}

	Value::String(format!("{}{}", display_value(left), display_value(right)))
}

fn kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

fn lookup<C: Capabilities>(context: &C, path: &PropertyPath) -> MdonResult<Value> {
	let mut segments = path.iter();
	let Some(Segment::Key(head)) = segments.next() else {
		return Err(MdonError::UndefinedProperty {
			property: path.to_string(),
			target: "the context".to_string(),
		});
	};

	let mut value = context
		.property(head)
		.ok_or_else(|| MdonError::UndefinedProperty {
			property: head.clone(),
			target: "the context".to_string(),
		})?;
	let mut walked = head.clone();

	for segment in segments {
		value = access(value, segment, &walked)?;
		match segment {
			Segment::Key(key) => walked.push_str(&format!(".{key}")),
			Segment::Index(index) => walked.push_str(&format!("[{index}]")),
		}
	}

	Ok(value)
}

fn access(value: Value, segment: &Segment, target: &str) -> MdonResult<Value> {
	let missing = || {
		MdonError::UndefinedProperty {
			property: match segment {
				Segment::Key(key) => key.clone(),
				Segment::Index(index) => index.to_string(),
			},
			target: target.to_string(),
		}
	};

	match (value, segment) {
		(Value::Object(mut object), Segment::Key(key)) => object.remove(key).ok_or_else(missing),
		(Value::Object(mut object), Segment::Index(index)) => {
			object.remove(&index.to_string()).ok_or_else(missing)
		}
		(Value::Array(mut items), Segment::Index(index)) if *index < items.len() => {
			Ok(items.swap_remove(*index))
		}
		(Value::Array(items), Segment::Key(key)) if key == "length" => Ok(Value::from(items.len())),
		(Value::String(string), Segment::Key(key)) if key == "length" => {
			Ok(Value::from(string.chars().count()))
		}
		(Value::String(string), Segment::Index(index)) => {
			string
				.chars()
				.nth(*index)
				.map(|ch| Value::String(ch.to_string()))
				.ok_or_else(missing)
		}
		_ => Err(missing()),
	}
}

fn arity(name: &str, arguments: &[Value], min: usize, max: usize) -> MdonResult<()> {
	if (min..=max).contains(&arguments.len()) {
		return Ok(());
	}

	let expected = if min == max {
		min.to_string()
	} else {
		format!("{min} to {max}")
	};

	Err(MdonError::InvalidArguments {
		name: name.to_string(),
		expected,
		got: arguments.len(),
	})
}

/// Operation arguments that are not strings read as empty text.
fn text(value: Option<&Value>) -> &str {
	match value {
		Some(Value::String(string)) => string,
		_ => "",
	}
}

fn invoke<C: Capabilities>(context: &mut C, name: &str, arguments: Vec<Value>) -> MdonResult<Value> {
	tracing::trace!(operation = name, arguments = arguments.len(), "invoking operation");

	match name {
		"format" => {
			arity(name, &arguments, 1, 1)?;
			Ok(Value::String(context.format(&arguments[0])))
		}
		"resolve" => {
			arity(name, &arguments, 1, 1)?;
			Ok(context.resolve(text(arguments.first())))
		}
		"alias" => {
			arity(name, &arguments, 1, 2)?;
			if text(arguments.first()).trim().is_empty() {
				return Err(MdonError::BlankReference(display_value(&arguments[0])));
			}
			let prefix = match arguments.get(1) {
				None | Some(Value::Null) => DEFAULT_ALIAS_PREFIX,
				Some(Value::String(prefix)) => prefix.as_str(),
				Some(other) => {
					return Err(MdonError::InvalidPrefix {
						reference: text(arguments.first()).to_string(),
						prefix: display_value(other),
					});
				}
			};
			Ok(Value::String(context.alias(text(arguments.first()), prefix)?))
		}
		"ref" => {
			arity(name, &arguments, 1, 1)?;
			Ok(Value::String(context.reference(text(arguments.first()))?))
		}
		"exists" => {
			arity(name, &arguments, 1, 1)?;
			Ok(Value::String(context.exists(text(arguments.first()))))
		}
		"include" => {
			arity(name, &arguments, 1, 1)?;
			Ok(Value::String(context.include(text(arguments.first()))?))
		}
		"parse" => {
			arity(name, &arguments, 1, 1)?;
			let markdown = display_value(&arguments[0]);
			Ok(Value::String(context.parse(&markdown)?))
		}
		"timestamp" => {
			arity(name, &arguments, 0, 0)?;
			Ok(Value::String(context.timestamp()))
		}
		"links" => {
			arity(name, &arguments, 0, 0)?;
			Ok(Value::String(context.links()))
		}
		"exception" => {
			arity(name, &arguments, 0, 1)?;
			let message = arguments.first().map(display_value).unwrap_or_default();
			Ok(Value::String(format_exception(&message)))
		}
		_ => Err(MdonError::UnknownOperation(name.to_string())),
	}
}
