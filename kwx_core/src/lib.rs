//! `kwx_core` is the core library for the kwx keyword expander. It scans a
//! character stream for `{keyword}` placeholders and replaces each one with
//! text produced by a pluggable resolver. Escapes (`\{` and `\\`) embed
//! literal braces and backslashes.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Character source (string, iterator, or buffered reader)
//!   → Expander (lazy Default / Keyword / Escaped state machine)
//!   → KeywordResolver (single source, or an AggregateResolver of prefixed sources)
//!   → Character sink (iterator, string, or writer)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `kwx.toml`, turning data files, literal values and
//!   the process environment into prefixed resolvers.
//!
//! ## Key Types
//!
//! - [`Expander`]: Owns the placeholder scanner and delegates completed keywords to a resolver.
//! - [`KeywordResolver`]: The resolution capability: can a keyword expand, what does it expand
//!   to, and which keywords are known.
//! - [`PropertyResolver`]: Resolves against the fields of any `serde::Serialize` value.
//! - [`LookupResolver`]: Resolves through a [`Lookup`] such as a map or the environment.
//! - [`PairsResolver`]: Resolves from an ordered list of name/value pairs.
//! - [`AggregateResolver`]: Combines prefixed resolvers with override and fallback dispatch.
//!
//! ## Quick Start
//!
//! ```rust
//! use kwx_core::AggregateResolver;
//! use kwx_core::Expander;
//! use kwx_core::KeywordPairs;
//! use kwx_core::PairsResolver;
//!
//! let mut aggregate = AggregateResolver::new();
//! let app: KeywordPairs = [("name", "kwx")].into_iter().collect();
//! aggregate.add(PairsResolver::new(app), "app").unwrap();
//!
//! let expander = Expander::new(aggregate);
//! let output = expander.expand_str("{app.name} expands \\{name}").unwrap();
//! assert_eq!(output, "kwx expands {name}");
//! ```

pub use aggregate::*;
pub use error::*;
pub use lexer::*;
pub use resolver::*;
pub use stream::*;

mod aggregate;
pub mod config;
#[allow(unused_assignments)]
mod error;
mod lexer;
mod resolver;
mod stream;

#[cfg(test)]
mod __fixtures;
