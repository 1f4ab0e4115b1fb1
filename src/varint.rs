// IGA variable-length integer encoding.
//
// The value is shifted left by one so that bit 0 can act as the terminator flag, then
// emitted most-significant group first. Lead bytes carry 7 bits each in bits 1..=7 with
// bit 0 clear. The final byte carries the low 8 bits of the shifted value with bit 0 set,
// so bit 7 of the final byte and bit 0 of the previous lead byte overlap in the decoder.
// This asymmetry is part of the format and must not be normalised.

use std::io::{self, Read, Write};

use thiserror::Error;

/// Maximum encoded length: four lead bytes plus the final byte.
pub const MAX_VARINT_LEN: usize = 5;

/// Largest value that fits in `MAX_VARINT_LEN` bytes.
pub const MAX_VALUE: u64 = (1 << 35) - 1;

/// Represents a malformed or unrepresentable variable-length integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VarIntError {
	/// The input ended before a terminating byte.
	#[error("varint truncated")]
	Truncated,

	/// The value needs more than `MAX_VARINT_LEN` bytes.
	#[error("varint overflow")]
	Overflow,
}

impl From<VarIntError> for io::Error {
	fn from(value: VarIntError) -> Self {
		match value {
			VarIntError::Truncated => io::Error::new(io::ErrorKind::UnexpectedEof, value),
			VarIntError::Overflow => io::Error::new(io::ErrorKind::InvalidData, value),
		}
	}
}

/// Encodes `value` into the tail of `buf`, returning the number of bytes used.
///
/// The encoded bytes are `buf[MAX_VARINT_LEN - len..]`.
pub fn encode_into(value: u64, buf: &mut [u8; MAX_VARINT_LEN]) -> Result<usize, VarIntError> {
	if value > MAX_VALUE {
		return Err(VarIntError::Overflow);
	}

	let shifted = value << 1;
	let mut i = MAX_VARINT_LEN - 1;

	buf[i] = shifted as u8 | 1;

	let mut rest = shifted >> 8;

	while rest != 0 {
		i -= 1;
		buf[i] = ((rest & 0x7F) as u8) << 1;
		rest >>= 7;
	}

	Ok(MAX_VARINT_LEN - i)
}

/// Encodes `value` into a freshly allocated buffer.
pub fn encode(value: u64) -> Result<Vec<u8>, VarIntError> {
	let mut buf = [0; MAX_VARINT_LEN];
	let len = encode_into(value, &mut buf)?;

	Ok(buf[MAX_VARINT_LEN - len..].to_vec())
}

/// Encodes `value` and writes it to `w`.
pub fn write<W>(w: &mut W, value: u64) -> io::Result<()>
where
	W: Write,
{
	let mut buf = [0; MAX_VARINT_LEN];
	let len = encode_into(value, &mut buf)?;

	w.write_all(&buf[MAX_VARINT_LEN - len..])
}

/// Returns the number of bytes `value` occupies once encoded.
pub fn encoded_len(value: u64) -> usize {
	let mut len = 1;
	let mut rest = (value << 1) >> 8;

	while rest != 0 {
		len += 1;
		rest >>= 7;
	}

	len
}

/// Decodes one value from the start of `data`.
///
/// Returns `(value, bytes_consumed)`, or `None` if `data` is empty, which marks the end of
/// a bounded region rather than an error.
pub fn decode(data: &[u8]) -> Result<Option<(u64, usize)>, VarIntError> {
	if data.is_empty() {
		return Ok(None);
	}

	let mut acc: u64 = 0;

	for (i, &byte) in data.iter().enumerate() {
		if i == MAX_VARINT_LEN {
			return Err(VarIntError::Overflow);
		}

		acc = (acc << 7) | u64::from(byte);

		if acc & 1 == 1 {
			return Ok(Some((acc >> 1, i + 1)));
		}
	}

	Err(VarIntError::Truncated)
}

/// Reads one value from a streaming source.
///
/// Returns `None` if the source is exhausted before the first byte. Exhaustion after that
/// is reported as [`io::ErrorKind::UnexpectedEof`].
pub fn read<R>(r: &mut R) -> io::Result<Option<u64>>
where
	R: Read,
{
	let mut acc: u64 = 0;
	let mut buf = [0; 1];

	for i in 0..MAX_VARINT_LEN {
		match r.read_exact(&mut buf) {
			Ok(()) => {}
			Err(err) if i == 0 && err.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
			Err(err) => return Err(err),
		}

		acc = (acc << 7) | u64::from(buf[0]);

		if acc & 1 == 1 {
			return Ok(Some(acc >> 1));
		}
	}

	Err(VarIntError::Overflow.into())
}
