//! `mdon_core` is the engine behind [mdon](https://github.com/mdon-rs/mdon), a
//! markdown preprocessor. Directive envelopes embedded in a document are
//! evaluated against project metadata and a small set of operations, and
//! their bodies are regenerated in place. Running it again over its own output
//! changes nothing.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Markdown document
//!   → Line-break normalization
//!   → Fragment splitter (literal text and directive envelopes)
//!   → Directive evaluator (logos lexer, expression parser, context operations)
//!   → Assembler (regenerated envelopes, link footer, normalization)
//! ```
//!
//! ## Directives
//!
//! ```md
//! <? {{ name }} ?>
//! regenerated on every run
//! <?!>
//!
//! <!--? @alias('./CONTRIBUTING.md') ?-->
//! link-1
//! <!--?!-->
//! ```
//!
//! The commented form keeps directives hidden when the markdown is rendered.
//! A directive whose expression is `!` is removed together with its body.
//!
//! ## Modules
//!
//! - [`config`]: `mdon.toml` loading and manifest metadata.
//! - [`project`]: the document driver, including output paths and backups.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mdon_core::Context;
//! use mdon_core::parse;
//!
//! let mut context = Context::new(serde_json::Map::new(), ".");
//! let output = parse("<? @alias('./docs/guide.md') ?>\n<?!>\n", &mut context).unwrap();
//! assert!(output.contains("[link-1]: ./docs/guide.md"));
//! ```

pub use config::*;
pub use context::*;
pub use engine::*;
pub use error::*;
pub use evaluator::*;
pub use expression::*;
pub use fragments::*;
pub use grammar::*;
pub use project::*;

pub mod config;
mod context;
mod engine;
#[allow(unused_assignments)]
mod error;
mod evaluator;
mod expression;
mod fragments;
mod grammar;
pub(crate) mod lexer;
pub mod project;
pub(crate) mod tokens;
