use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use crate::KwxError;
use crate::KwxResult;
use crate::resolver::KeywordResolver;
use crate::resolver::Keywords;

/// Composes several resolvers, each qualified by a unique prefix, into one.
///
/// A keyword is dispatched in this order:
///
/// 1. `prefix.keyword` is split at the first `.`.
/// 2. A hard override registered for the bare keyword wins outright, even
///    over an explicit prefix.
/// 3. An explicit prefix selects its resolver directly, without fallback.
/// 4. Otherwise resolvers are searched in the order they were added.
///
/// Registration must finish before any expansion starts; the aggregate is
/// only borrowed immutably while scanning.
#[derive(Default)]
pub struct AggregateResolver<'a> {
	resolvers: Vec<(String, Box<dyn KeywordResolver + 'a>)>,
	/// Bare keyword name to an index into `resolvers`.
	overrides: HashMap<String, usize>,
}

impl fmt::Debug for AggregateResolver<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AggregateResolver")
			.field("prefixes", &self.prefixes().collect::<Vec<_>>())
			.field("overrides", &self.overrides)
			.finish()
	}
}

impl<'a> AggregateResolver<'a> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a resolver to this aggregate, qualified by `prefix`.
	pub fn add(
		&mut self,
		resolver: impl KeywordResolver + 'a,
		prefix: impl Into<String>,
	) -> KwxResult<()> {
		let prefix = prefix.into();

		if self.position(&prefix).is_some() {
			return Err(KwxError::DuplicatePrefix(prefix));
		}

		tracing::debug!(prefix = %prefix, "registering keyword resolver");
		self.resolvers.push((prefix, Box::new(resolver)));

		Ok(())
	}

	/// Force `keyword` to always resolve through the resolver registered
	/// under `prefix`.
	pub fn add_override(&mut self, keyword: impl Into<String>, prefix: &str) -> KwxResult<()> {
		let index = self
			.position(prefix)
			.ok_or_else(|| KwxError::UnknownPrefix(prefix.to_string()))?;
		let keyword = keyword.into();

		tracing::debug!(keyword = %keyword, prefix = %prefix, "registering keyword override");
		self.overrides.insert(keyword, index);

		Ok(())
	}

	/// Registered prefixes in insertion order.
	pub fn prefixes(&self) -> impl Iterator<Item = &str> {
		self.resolvers.iter().map(|(prefix, _)| prefix.as_str())
	}

	pub fn get(&self, prefix: &str) -> Option<&(dyn KeywordResolver + 'a)> {
		self.position(prefix)
			.map(|index| self.resolvers[index].1.as_ref())
	}

	pub fn len(&self) -> usize {
		self.resolvers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.resolvers.is_empty()
	}

	fn position(&self, prefix: &str) -> Option<usize> {
		self.resolvers
			.iter()
			.position(|(existing, _)| existing == prefix)
	}
}

/// Split `prefix.keyword` at the first `.`.
pub fn split_keyword(keyword: &str) -> (Option<&str>, &str) {
	match keyword.split_once('.') {
		Some((prefix, remainder)) => (Some(prefix), remainder),
		None => (None, keyword),
	}
}

impl KeywordResolver for AggregateResolver<'_> {
	/// Probes every resolver with the keyword exactly as given.
	///
	/// Unlike [`KeywordResolver::expand_keyword`] this does not split off a
	/// prefix or consult overrides, so `a.x` is only reported as expandable
	/// when some resolver knows a keyword literally named `a.x`.
	// TODO: decide whether this should honour prefix splitting like
	// `expand_keyword` does.
	fn can_expand(&self, keyword: &str) -> bool {
		self.resolvers
			.iter()
			.any(|(_, resolver)| resolver.can_expand(keyword))
	}

	fn expand_keyword(&self, keyword: &str) -> KwxResult<Cow<'_, str>> {
		let (prefix, remainder) = split_keyword(keyword);

		if let Some(&index) = self.overrides.get(remainder) {
			let (owner, resolver) = &self.resolvers[index];
			tracing::trace!(keyword = %keyword, prefix = %owner, "expanding through override");
			return resolver.expand_keyword(remainder);
		}

		if let Some(prefix) = prefix {
			let Some(index) = self.position(prefix) else {
				return Err(KwxError::KeywordNotFound(keyword.to_string()));
			};

			tracing::trace!(keyword = %keyword, prefix = %prefix, "expanding through prefix");
			return self.resolvers[index].1.expand_keyword(remainder);
		}

		for (owner, resolver) in &self.resolvers {
			if resolver.can_expand(remainder) {
				tracing::trace!(keyword = %keyword, prefix = %owner, "expanding through fallback");
				return resolver.expand_keyword(remainder);
			}
		}

		Err(KwxError::KeywordNotFound(keyword.to_string()))
	}

	fn known_keywords(&self) -> Keywords<'_> {
		Box::new(self.resolvers.iter().flat_map(|(prefix, resolver)| {
			resolver
				.known_keywords()
				.map(move |keyword| keyword.map(|keyword| format!("{prefix}.{keyword}")))
		}))
	}
}
