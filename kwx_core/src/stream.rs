use std::io::BufRead;
use std::io::ErrorKind;
use std::io::Write;

use crate::Expander;
use crate::KwxError;
use crate::KwxResult;
use crate::resolver::KeywordResolver;

/// Lazily decode UTF-8 characters from a buffered reader, one at a time.
pub fn read_chars<R: BufRead>(reader: R) -> ReadChars<R> {
	ReadChars {
		reader,
		finished: false,
	}
}

/// Iterator returned by [`read_chars`]. Ends at end of input or after the
/// first error.
#[derive(Debug)]
pub struct ReadChars<R> {
	reader: R,
	finished: bool,
}

impl<R: BufRead> ReadChars<R> {
	fn next_byte(&mut self) -> std::io::Result<Option<u8>> {
		loop {
			let buffer = match self.reader.fill_buf() {
				Ok(buffer) => buffer,
				Err(e) if e.kind() == ErrorKind::Interrupted => continue,
				Err(e) => return Err(e),
			};

			let Some(&byte) = buffer.first() else {
				return Ok(None);
			};

			self.reader.consume(1);
			return Ok(Some(byte));
		}
	}

	fn read_char(&mut self) -> std::io::Result<Option<char>> {
		let Some(first) = self.next_byte()? else {
			return Ok(None);
		};

		let width = utf8_width(first)
			.ok_or_else(|| invalid_utf8(format!("unexpected byte 0x{first:02x}")))?;
		let mut bytes = [first, 0, 0, 0];

		for slot in bytes.iter_mut().take(width).skip(1) {
			*slot = self
				.next_byte()?
				.ok_or_else(|| invalid_utf8("input ended inside a character".to_string()))?;
		}

		let text = std::str::from_utf8(&bytes[..width]).map_err(|e| invalid_utf8(e.to_string()))?;
		Ok(text.chars().next())
	}
}

fn utf8_width(first: u8) -> Option<usize> {
	match first {
		0x00..=0x7f => Some(1),
		0xc2..=0xdf => Some(2),
		0xe0..=0xef => Some(3),
		0xf0..=0xf4 => Some(4),
		_ => None,
	}
}

fn invalid_utf8(reason: String) -> std::io::Error {
	std::io::Error::new(ErrorKind::InvalidData, format!("invalid UTF-8: {reason}"))
}

impl<R: BufRead> Iterator for ReadChars<R> {
	type Item = KwxResult<char>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.finished {
			return None;
		}

		match self.read_char() {
			Ok(Some(ch)) => Some(Ok(ch)),
			Ok(None) => {
				self.finished = true;
				None
			}
			Err(e) => {
				self.finished = true;
				Some(Err(KwxError::Io(e)))
			}
		}
	}
}

impl<R: KeywordResolver> Expander<R> {
	/// Expand everything readable from `input` into `output`, then flush.
	///
	/// Characters are written as they are produced, so on failure `output`
	/// holds everything up to the failing placeholder.
	pub fn expand_reader<I, O>(&self, input: I, mut output: O) -> KwxResult<()>
	where
		I: BufRead,
		O: Write,
	{
		let mut encoded = [0; 4];

		for ch in self.try_expand(read_chars(input)) {
			output.write_all(ch?.encode_utf8(&mut encoded).as_bytes())?;
		}

		output.flush()?;
		Ok(())
	}

	/// Expand `input` fully into a single string.
	pub fn expand_string<I>(&self, input: I) -> KwxResult<String>
	where
		I: IntoIterator<Item = char>,
	{
		self.expand(input).collect()
	}

	pub fn expand_str(&self, input: &str) -> KwxResult<String> {
		self.expand_string(input.chars())
	}
}
