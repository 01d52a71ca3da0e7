use std::borrow::Cow;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::HashSet;
use std::hash::BuildHasher;

use derive_more::Deref;
use derive_more::DerefMut;
use serde::Serialize;

use crate::KwxError;
use crate::KwxResult;

/// A lazy enumeration of keyword names. Resolvers that cannot enumerate yield
/// a single [`KwxError::UnsupportedOperation`] item.
pub type Keywords<'a> = Box<dyn Iterator<Item = KwxResult<String>> + 'a>;

/// The capability an [`Expander`](crate::Expander) delegates to whenever a
/// `{keyword}` placeholder closes.
pub trait KeywordResolver {
	/// Returns `true` when `keyword` can be expanded by this resolver.
	fn can_expand(&self, keyword: &str) -> bool;

	/// Produce the expansion text for `keyword`.
	///
	/// This may be called without a prior [`KeywordResolver::can_expand`]
	/// check, so implementations must fail cleanly for unknown keywords.
	fn expand_keyword(&self, keyword: &str) -> KwxResult<Cow<'_, str>>;

	/// Every keyword this resolver knows about.
	fn known_keywords(&self) -> Keywords<'_>;
}

impl<R: KeywordResolver + ?Sized> KeywordResolver for &R {
	fn can_expand(&self, keyword: &str) -> bool {
		(**self).can_expand(keyword)
	}

	fn expand_keyword(&self, keyword: &str) -> KwxResult<Cow<'_, str>> {
		(**self).expand_keyword(keyword)
	}

	fn known_keywords(&self) -> Keywords<'_> {
		(**self).known_keywords()
	}
}

impl<R: KeywordResolver + ?Sized> KeywordResolver for Box<R> {
	fn can_expand(&self, keyword: &str) -> bool {
		(**self).can_expand(keyword)
	}

	fn expand_keyword(&self, keyword: &str) -> KwxResult<Cow<'_, str>> {
		(**self).expand_keyword(keyword)
	}

	fn known_keywords(&self) -> Keywords<'_> {
		(**self).known_keywords()
	}
}

fn unsupported_enumeration<'a>(what: &str) -> Keywords<'a> {
	Box::new(std::iter::once(Err(KwxError::UnsupportedOperation(format!(
		"{what} cannot enumerate its keys"
	)))))
}

/// Resolves keywords against the named fields of a structured value.
///
/// Any [`Serialize`] value can be wrapped; its top-level fields (after serde
/// renames) become the known keywords. Strings expand to their raw text,
/// `null` expands to nothing and every other value expands to compact JSON.
#[derive(Debug, Clone)]
pub struct PropertyResolver {
	fields: serde_json::Map<String, serde_json::Value>,
}

impl PropertyResolver {
	/// Wrap an already serialized value. Values that are not objects expose
	/// no fields.
	pub fn new(value: serde_json::Value) -> Self {
		let fields = match value {
			serde_json::Value::Object(fields) => fields,
			_ => serde_json::Map::new(),
		};

		Self { fields }
	}

	pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> KwxResult<Self> {
		let value = serde_json::to_value(value).map_err(|e| KwxError::Serialize(e.to_string()))?;
		Ok(Self::new(value))
	}

	pub fn fields(&self) -> &serde_json::Map<String, serde_json::Value> {
		&self.fields
	}
}

/// Render a field value as expansion text.
pub(crate) fn value_to_text(value: &serde_json::Value) -> Cow<'_, str> {
	match value {
		serde_json::Value::String(text) => Cow::Borrowed(text.as_str()),
		serde_json::Value::Null => Cow::Borrowed(""),
		other => Cow::Owned(other.to_string()),
	}
}

impl KeywordResolver for PropertyResolver {
	fn can_expand(&self, keyword: &str) -> bool {
		self.fields.contains_key(keyword)
	}

	fn expand_keyword(&self, keyword: &str) -> KwxResult<Cow<'_, str>> {
		self.fields
			.get(keyword)
			.map(value_to_text)
			.ok_or_else(|| KwxError::FieldNotFound(keyword.to_string()))
	}

	fn known_keywords(&self) -> Keywords<'_> {
		Box::new(self.fields.keys().map(|name| Ok(name.clone())))
	}
}

/// A string keyed lookup that may or may not be able to list its keys.
pub trait Lookup {
	fn lookup(&self, key: &str) -> Option<Cow<'_, str>>;

	/// Enumerate every key, or `None` when the source cannot enumerate.
	fn keys(&self) -> Option<Box<dyn Iterator<Item = String> + '_>> {
		None
	}
}

impl<S: BuildHasher> Lookup for HashMap<String, String, S> {
	fn lookup(&self, key: &str) -> Option<Cow<'_, str>> {
		self.get(key).map(|value| Cow::Borrowed(value.as_str()))
	}

	fn keys(&self) -> Option<Box<dyn Iterator<Item = String> + '_>> {
		Some(Box::new(HashMap::keys(self).cloned()))
	}
}

impl Lookup for BTreeMap<String, String> {
	fn lookup(&self, key: &str) -> Option<Cow<'_, str>> {
		self.get(key).map(|value| Cow::Borrowed(value.as_str()))
	}

	fn keys(&self) -> Option<Box<dyn Iterator<Item = String> + '_>> {
		Some(Box::new(BTreeMap::keys(self).cloned()))
	}
}

/// Adapts a closure into a [`Lookup`]. Closures cannot enumerate their keys.
pub struct FnLookup<F>(pub F);

impl<F> Lookup for FnLookup<F>
where
	F: Fn(&str) -> Option<String>,
{
	fn lookup(&self, key: &str) -> Option<Cow<'_, str>> {
		(self.0)(key).map(Cow::Owned)
	}
}

/// The environment of the current process. Variables whose names or values
/// are not valid unicode are invisible.
#[derive(Debug, Clone, Copy, Default)]
pub struct Environment;

impl Lookup for Environment {
	fn lookup(&self, key: &str) -> Option<Cow<'_, str>> {
		std::env::var(key).ok().map(Cow::Owned)
	}

	fn keys(&self) -> Option<Box<dyn Iterator<Item = String> + '_>> {
		Some(Box::new(
			std::env::vars_os().filter_map(|(key, _)| key.into_string().ok()),
		))
	}
}

/// Resolves keywords through an arbitrary [`Lookup`].
#[derive(Debug, Clone, Default)]
pub struct LookupResolver<L> {
	lookup: L,
}

impl<L: Lookup> LookupResolver<L> {
	pub fn new(lookup: L) -> Self {
		Self { lookup }
	}

	pub fn lookup(&self) -> &L {
		&self.lookup
	}
}

impl<L: Lookup> KeywordResolver for LookupResolver<L> {
	fn can_expand(&self, keyword: &str) -> bool {
		self.lookup.lookup(keyword).is_some()
	}

	fn expand_keyword(&self, keyword: &str) -> KwxResult<Cow<'_, str>> {
		self.lookup
			.lookup(keyword)
			.ok_or_else(|| KwxError::KeywordNotFound(keyword.to_string()))
	}

	fn known_keywords(&self) -> Keywords<'_> {
		match self.lookup.keys() {
			Some(keys) => Box::new(keys.map(Ok)),
			None => unsupported_enumeration("the lookup"),
		}
	}
}

/// An ordered list of name/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut)]
pub struct KeywordPairs(Vec<(String, String)>);

impl KeywordPairs {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.0.push((name.into(), value.into()));
	}

	/// The value of the first pair named `name`.
	pub fn value_of(&self, name: &str) -> Option<&str> {
		self.0
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.as_str())
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeywordPairs {
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		Self(
			iter.into_iter()
				.map(|(name, value)| (name.into(), value.into()))
				.collect(),
		)
	}
}

/// The most basic resolver: give it a list of pairs and it resolves from the
/// list's contents. The first pair wins when a name repeats.
#[derive(Debug, Clone, Default)]
pub struct PairsResolver {
	pairs: KeywordPairs,
}

impl PairsResolver {
	pub fn new(pairs: impl Into<KeywordPairs>) -> Self {
		Self {
			pairs: pairs.into(),
		}
	}

	pub fn pairs(&self) -> &KeywordPairs {
		&self.pairs
	}
}

impl From<Vec<(String, String)>> for KeywordPairs {
	fn from(pairs: Vec<(String, String)>) -> Self {
		Self(pairs)
	}
}

impl KeywordResolver for PairsResolver {
	fn can_expand(&self, keyword: &str) -> bool {
		self.pairs.value_of(keyword).is_some()
	}

	fn expand_keyword(&self, keyword: &str) -> KwxResult<Cow<'_, str>> {
		self.pairs
			.value_of(keyword)
			.map(Cow::Borrowed)
			.ok_or_else(|| KwxError::KeywordNotFound(keyword.to_string()))
	}

	fn known_keywords(&self) -> Keywords<'_> {
		let mut seen = HashSet::new();
		Box::new(
			self.pairs
				.iter()
				.filter(move |(name, _)| seen.insert(name.as_str()))
				.map(|(name, _)| Ok(name.clone())),
		)
	}
}
