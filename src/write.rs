use std::io::{Read, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use log::debug;

use crate::{error::WriteError, varint, xor, MAGIC, RESERVED_FIELD};

/// Represents the largest length or offset written, matching the 32-bit fields of existing tools.
pub const MAX_FIELD: u64 = u32::MAX as u64;

/// Represents a writer of archives.
///
/// The header precedes the tables, which precede the payloads, so every block is held until [`Writer::finish`]
/// and nothing reaches the destination if any entry fails.
#[derive(Debug, Default)]
pub struct Writer {
	id: u32,
	table: Vec<u8>,
	names: Vec<u8>,
	data: Vec<u8>,
	count: usize,
}

impl Writer {
	/// Creates a new writer with the specified archive identifier.
	pub fn new(id: u32) -> Self {
		Self {
			id,
			table: Vec::new(),
			names: Vec::new(),
			data: Vec::new(),
			count: 0,
		}
	}

	/// Attempts to append a single entry called `name` from `src`, returning the length of its payload.
	///
	/// Entries are stored in the order they are written, which determines where each name ends.
	pub fn write<T>(&mut self, name: &str, src: &mut T) -> Result<u64, WriteError>
	where
		T: Read,
	{
		let name_off = self.names.len();
		let off = self.data.len();

		let result = self.append(name, src);

		// Leave no trace of a rejected entry.

		if result.is_err() {
			self.names.truncate(name_off);
			self.data.truncate(off);
		}

		result
	}

	/// Returns the number of entries written so far.
	pub fn len(&self) -> usize {
		self.count
	}

	/// Returns if no entries have been written.
	pub fn is_empty(&self) -> bool {
		self.count == 0
	}

	/// Writes the header, tables and payloads to `inner`, consuming `self` in the process.
	pub fn finish<W>(self, inner: &mut W) -> Result<(), WriteError>
	where
		W: Write,
	{
		let table_len = check("entry table length", self.table.len() as u64)?;
		let names_len = check("filename block length", self.names.len() as u64)?;

		debug!("archive {}: {table_len} table bytes, {names_len} filename bytes, {} payload bytes", self.id, self.data.len());

		// Write the header.

		inner.write_all(&MAGIC)?;
		inner.write_u32::<LittleEndian>(self.id)?;
		inner.write_u32::<LittleEndian>(RESERVED_FIELD)?;
		inner.write_u32::<LittleEndian>(RESERVED_FIELD)?;

		// Write the blocks, each but the last prefixed with its length.

		varint::write(inner, table_len)?;
		inner.write_all(&self.table)?;

		varint::write(inner, names_len)?;
		inner.write_all(&self.names)?;

		inner.write_all(&self.data)?;
		inner.flush()?;

		Ok(())
	}

	fn append<T>(&mut self, name: &str, src: &mut T) -> Result<u64, WriteError>
	where
		T: Read,
	{
		// Write the name as one varint per code point.

		let name_off = check("filename offset", self.names.len() as u64)?;

		for ch in name.chars() {
			varint::write(&mut self.names, u64::from(ch))?;
		}

		// Copy the payload, then obfuscate it in place.

		let off = self.data.len();
		let len = src.read_to_end(&mut self.data)? as u64;

		xor::transform(&mut self.data[off..]);

		let off = check("payload offset", off as u64)?;
		let len = check("payload length", len)?;

		// Write the properties of the entry.

		varint::write(&mut self.table, name_off)?;
		varint::write(&mut self.table, off)?;
		varint::write(&mut self.table, len)?;

		self.count += 1;

		Ok(len)
	}
}

/// Builds a complete archive in memory from ordered `(name, payload)` pairs.
pub fn build<N, D>(id: u32, files: &[(N, D)]) -> Result<Vec<u8>, WriteError>
where
	N: AsRef<str>,
	D: AsRef<[u8]>,
{
	let mut out = Vec::new();
	let mut writer = Writer::new(id);

	for (name, data) in files {
		writer.write(name.as_ref(), &mut data.as_ref())?;
	}

	writer.finish(&mut out)?;

	Ok(out)
}

fn check(field: &'static str, value: u64) -> Result<u64, WriteError> {
	if value > MAX_FIELD {
		return Err(WriteError::ValueTooLarge {
			field,
			value,
		});
	}

	Ok(value)
}
