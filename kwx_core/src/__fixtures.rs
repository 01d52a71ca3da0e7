use serde::Serialize;

use crate::AggregateResolver;
use crate::KeywordPairs;
use crate::PairsResolver;

#[derive(Debug, Serialize)]
pub struct Package {
	pub name: String,
	pub version: String,
	pub downloads: u64,
	#[serde(rename = "isPrivate")]
	pub private: bool,
	pub homepage: Option<String>,
}

pub fn package() -> Package {
	Package {
		name: "kwx".to_string(),
		version: "1.2.3".to_string(),
		downloads: 42,
		private: false,
		homepage: None,
	}
}

pub fn pairs<const N: usize>(entries: [(&str, &str); N]) -> PairsResolver {
	let pairs: KeywordPairs = entries.into_iter().collect();
	PairsResolver::new(pairs)
}

pub fn greeting_resolver() -> PairsResolver {
	pairs([("name", "world"), ("greeting", "hello")])
}

/// `a` resolves `x` to `1` and `b` resolves `x` to `2`. Only `b` knows `y`.
pub fn prefixed_aggregate() -> AggregateResolver<'static> {
	let mut aggregate = AggregateResolver::new();
	aggregate
		.add(pairs([("x", "1"), ("k1", "a1"), ("k2", "a2")]), "a")
		.unwrap_or_else(|e| panic!("add a: {e}"));
	aggregate
		.add(pairs([("x", "2"), ("y", "why"), ("k1", "b1")]), "b")
		.unwrap_or_else(|e| panic!("add b: {e}"));
	aggregate
}
