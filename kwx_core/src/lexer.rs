use std::borrow::Cow;
use std::iter::FusedIterator;

use crate::KwxError;
use crate::KwxResult;
use crate::resolver::KeywordResolver;

/// Scan state for a single expansion pass.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ScanMode {
	/// Regular plaintext: characters pass through unchanged.
	Default,
	/// A `{` was seen and a keyword name is being accumulated.
	Keyword(String),
	/// A `\` was seen; the next character is emitted verbatim. Only `\{` and
	/// `\\` are meaningful, but any character is accepted.
	Escaped,
}

/// Drives the `{keyword}` scanner over character streams, delegating every
/// completed placeholder to a single [`KeywordResolver`].
///
/// The expander itself holds no scan state. Each call to
/// [`Expander::expand`] returns a fresh [`Expand`] iterator which owns the
/// state for that pass, so one expander can serve any number of passes.
#[derive(Debug, Clone, Default)]
pub struct Expander<R> {
	resolver: R,
}

impl<R: KeywordResolver> Expander<R> {
	pub fn new(resolver: R) -> Self {
		Self { resolver }
	}

	pub fn resolver(&self) -> &R {
		&self.resolver
	}

	pub fn into_resolver(self) -> R {
		self.resolver
	}

	/// Lazily expand every placeholder in `input`.
	///
	/// ```rust
	/// use kwx_core::Expander;
	/// use kwx_core::PairsResolver;
	///
	/// let expander = Expander::new(PairsResolver::new(vec![(
	/// 	"name".to_string(),
	/// 	"world".to_string(),
	/// )]));
	/// let output: String = expander
	/// 	.expand("hello {name} \\{name}".chars())
	/// 	.collect::<Result<_, _>>()
	/// 	.unwrap();
	/// assert_eq!(output, "hello world {name}");
	/// ```
	pub fn expand<I>(&self, input: I) -> Expand<'_, R, CharsOk<I::IntoIter>>
	where
		I: IntoIterator<Item = char>,
	{
		self.try_expand(CharsOk(input.into_iter()))
	}

	/// Like [`Expander::expand`] but over a fallible source, such as
	/// [`read_chars`](crate::read_chars). A source error ends the pass.
	pub fn try_expand<I>(&self, input: I) -> Expand<'_, R, I::IntoIter>
	where
		I: IntoIterator<Item = KwxResult<char>>,
	{
		Expand {
			resolver: &self.resolver,
			input: input.into_iter(),
			mode: ScanMode::Default,
			pending: None,
			finished: false,
		}
	}
}

/// Lifts an infallible character iterator into the fallible form consumed
/// by [`Expand`].
#[derive(Debug, Clone)]
pub struct CharsOk<I>(I);

impl<I: Iterator<Item = char>> Iterator for CharsOk<I> {
	type Item = KwxResult<char>;

	fn next(&mut self) -> Option<Self::Item> {
		self.0.next().map(Ok)
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		self.0.size_hint()
	}
}

/// Expansion text that is still being emitted.
struct Pending<'r> {
	text: Cow<'r, str>,
	offset: usize,
}

impl Pending<'_> {
	fn next_char(&mut self) -> Option<char> {
		let ch = self.text[self.offset..].chars().next()?;
		self.offset += ch.len_utf8();
		Some(ch)
	}
}

/// A single-pass, lazy expansion of one input stream.
///
/// Input is only pulled when the consumer asks for the next character, so
/// unbounded sources are fine. Once an error is yielded the iterator is
/// exhausted; everything emitted before the error stays valid.
pub struct Expand<'r, R: ?Sized, I> {
	resolver: &'r R,
	input: I,
	mode: ScanMode,
	pending: Option<Pending<'r>>,
	finished: bool,
}

impl<'r, R, I> Expand<'r, R, I>
where
	R: KeywordResolver + ?Sized,
	I: Iterator<Item = KwxResult<char>>,
{
	fn next_pending(&mut self) -> Option<char> {
		let pending = self.pending.as_mut()?;
		let next = pending.next_char();
		if next.is_none() {
			self.pending = None;
		}
		next
	}

	fn finish(&mut self) {
		self.finished = true;

		match &self.mode {
			ScanMode::Keyword(keyword) => {
				tracing::trace!(keyword = %keyword, "dropping unterminated placeholder at end of input");
			}
			ScanMode::Escaped => {
				tracing::trace!("dropping dangling escape at end of input");
			}
			ScanMode::Default => {}
		}
	}

	fn resolve(&mut self, keyword: String) -> Option<KwxResult<char>> {
		let resolver = self.resolver;
		match resolver.expand_keyword(&keyword) {
			Ok(text) => {
				self.pending = Some(Pending { text, offset: 0 });
				None
			}
			Err(source) => {
				tracing::error!(keyword = %keyword, error = %source, "unable to expand keyword");
				self.finished = true;
				Some(Err(KwxError::KeywordResolution {
					keyword,
					source: Box::new(source),
				}))
			}
		}
	}
}

impl<'r, R, I> Iterator for Expand<'r, R, I>
where
	R: KeywordResolver + ?Sized,
	I: Iterator<Item = KwxResult<char>>,
{
	type Item = KwxResult<char>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.finished {
			return None;
		}

		loop {
			if let Some(ch) = self.next_pending() {
				return Some(Ok(ch));
			}

			let ch = match self.input.next() {
				Some(Ok(ch)) => ch,
				Some(Err(error)) => {
					self.finished = true;
					return Some(Err(error));
				}
				None => {
					self.finish();
					return None;
				}
			};

			match std::mem::replace(&mut self.mode, ScanMode::Default) {
				ScanMode::Escaped => return Some(Ok(ch)),
				ScanMode::Default => {
					match ch {
						'\\' => self.mode = ScanMode::Escaped,
						'{' => self.mode = ScanMode::Keyword(String::new()),
						_ => return Some(Ok(ch)),
					}
				}
				ScanMode::Keyword(mut keyword) => {
					match ch {
						// A second `{` abandons the placeholder and is emitted as is.
						'{' => return Some(Ok(ch)),
						'}' => {
							if let Some(error) = self.resolve(keyword) {
								return Some(error);
							}
						}
						_ => {
							keyword.push(ch);
							self.mode = ScanMode::Keyword(keyword);
						}
					}
				}
			}
		}
	}
}

impl<R, I> FusedIterator for Expand<'_, R, I>
where
	R: KeywordResolver + ?Sized,
	I: Iterator<Item = KwxResult<char>>,
{
}
