use std::{
	io::{self, Read, Seek, SeekFrom},
	ops::Range,
};

use byteorder::{ByteOrder, LittleEndian};
use log::debug;

use crate::{
	error::ReadError,
	varint::{self, VarIntError},
	xor, HEADER_SIZE, MAGIC,
};

/// Represents an archive.
#[derive(Debug)]
pub struct Archive<'a, R> {
	inner: &'a mut R,

	id: u32,
	data_start: u64,
	entries: Vec<Entry>,
}

/// Represents an entry.
#[derive(Debug, Clone, Hash, Eq, PartialEq, PartialOrd)]
pub struct Entry {
	/// The name of the entry, possibly containing `/` or `\` separators.
	pub name: String,

	/// The offset, in bytes, of the name within the filename block.
	pub name_off: u64,

	/// The offset, in bytes, of the payload within the payload block.
	pub off: u64,

	/// The length, in bytes, of the payload.
	pub len: u64,
}

/// Represents an entry opened for reading, yielding the restored payload bytes.
#[derive(Debug)]
pub struct OpenEntry<'a, R>
where
	R: Read + Seek,
{
	inner: &'a mut R,

	off: u64,
	len: u64,
	pos: u64,
}

/// Represents a reader of archives from a seekable source.
#[derive(Debug)]
pub struct Reader<'a, R>
where
	R: Read + Seek,
{
	inner: &'a mut R,
}

/// Represents an entry exactly as stored in the entry table.
#[derive(Debug, Clone, Copy)]
struct Record {
	name_off: u64,
	off: u64,
	len: u64,
}

impl<'a, R> Reader<'a, R>
where
	R: Read + Seek,
{
	/// Creates a new reader with the specified source.
	pub fn new(inner: &'a mut R) -> Self {
		Self {
			inner,
		}
	}

	/// Attempts to fully read the archive table, consuming `self` in the process.
	///
	/// Every payload is checked to lie within the source, however no payload is read.
	pub fn read(self) -> Result<Archive<'a, R>, ReadError> {
		let total = self.inner.seek(SeekFrom::End(0))?;

		self.inner.seek(SeekFrom::Start(0))?;

		// Read the header. The magic is checked first so that foreign files are never reported as truncated.

		let mut header = Vec::new();

		self.inner.by_ref().take(HEADER_SIZE).read_to_end(&mut header)?;

		let present = header.len().min(MAGIC.len());

		check_magic(&header[..present])?;

		if (header.len() as u64) < HEADER_SIZE {
			return Err(ReadError::TruncatedInput {
				region: "header",
				entry: None,
				expected: HEADER_SIZE,
				available: header.len() as u64,
			});
		}

		let id = LittleEndian::read_u32(&header[4..8]);

		// The remaining header fields are reserved and are not interpreted.

		// Read the entry table.

		let table_len = read_length(self.inner, "entry table length", total)?;
		let table = read_region(self.inner, "entry table", table_len)?;
		let records = parse_records(&table)?;

		// Read the filename block, which the payload block immediately follows.

		let names_len = read_length(self.inner, "filename block length", total)?;
		let data_start = self.inner.stream_position()? + names_len;
		let names = read_region(self.inner, "filename block", names_len)?;

		debug!("archive {id}: {} entries, {table_len} table bytes, {names_len} filename bytes, payloads at {data_start}", records.len());

		let offsets: Vec<u64> = records.iter().map(|record| record.name_off).collect();
		let spans = name_spans(&offsets, names_len)?;

		let mut entries: Vec<Entry> = Vec::with_capacity(records.len());

		for (index, (record, span)) in records.iter().zip(spans).enumerate() {
			let name = decode_name(&names[span], index)?;

			// Check that the payload lies within the source.

			let start = data_start.saturating_add(record.off);

			if start.checked_add(record.len).map_or(true, |end| end > total) {
				return Err(ReadError::TruncatedInput {
					region: "payload",
					entry: Some(index),
					expected: record.len,
					available: total.saturating_sub(start),
				});
			}

			entries.push(Entry {
				name,
				name_off: record.name_off,
				off: record.off,
				len: record.len,
			})
		}

		Ok(Archive {
			inner: self.inner,
			id,
			data_start,
			entries,
		})
	}
}

impl<'a, R> Archive<'a, R> {
	/// Returns the identifier of the archive.
	pub fn id(&self) -> u32 {
		self.id
	}

	/// Returns the absolute offset of the payload block.
	pub fn data_start(&self) -> u64 {
		self.data_start
	}

	/// Returns the number of entries in the archive.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns if the archive is void of any entries.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Returns the entry at the specified index, if it exists.
	pub fn get(&self, index: usize) -> Option<&Entry> {
		self.entries.get(index)
	}

	/// Returns an iterator over each of the entries in the archive, in table order.
	pub fn iter(&self) -> impl Iterator<Item = &Entry> {
		self.entries.iter()
	}

	/// Consumes the archive, returning its entries.
	pub fn into_entries(self) -> Vec<Entry> {
		self.entries
	}
}

impl<'a, I> Archive<'a, I>
where
	I: Read + Seek,
{
	/// Opens and returns the entry at the specified index for reading, if it exists.
	pub fn open(&mut self, index: usize) -> Option<OpenEntry<'_, I>> {
		let entry = self.entries.get(index)?;

		Some(OpenEntry {
			inner: self.inner,
			off: self.data_start + entry.off,
			len: entry.len,
			pos: 0,
		})
	}

	/// Reads the whole restored payload of the entry at the specified index.
	pub fn extract(&mut self, index: usize) -> Result<Vec<u8>, ReadError> {
		let mut open = self.open(index).ok_or_else(|| ReadError::InvalidEntry {
			index,
			reason: "no such entry".into(),
		})?;

		let mut buf = Vec::new();

		open.read_to_end(&mut buf)?;

		Ok(buf)
	}
}

impl<'a, R> Read for OpenEntry<'a, R>
where
	R: Read + Seek,
{
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		// Check if we have already reached the end of the entry.

		if self.pos >= self.len {
			return Ok(0);
		}

		// Seek to the start of the entry including any currently read bytes.

		self.inner.seek(io::SeekFrom::Start(self.off + self.pos))?;

		// Never read beyond the entry, then restore the bytes relative to the start of the payload.

		let len = (self.len - self.pos).min(buf.len() as u64) as usize;
		let num = self.inner.read(&mut buf[0..len])?;

		xor::transform_at(&mut buf[0..num], self.pos);

		self.pos += num as u64;

		Ok(num)
	}
}

/// Computes the span of each name within a filename block of `block_len` bytes.
///
/// Each name ends where the next one starts, and the last runs to the end of the block.
pub fn name_spans(offsets: &[u64], block_len: u64) -> Result<Vec<Range<usize>>, ReadError> {
	offsets
		.iter()
		.enumerate()
		.map(|(index, &start)| {
			let end = offsets.get(index + 1).copied().unwrap_or(block_len);

			if start > end || end > block_len {
				return Err(ReadError::InvalidEntry {
					index,
					reason: format!("filename span {start}..{end} outside block of {block_len} bytes"),
				});
			}

			Ok(start as usize..end as usize)
		})
		.collect()
}

/// Checks `magic` against the matching prefix of `MAGIC`, so that a short input is only rejected if what is present differs.
fn check_magic(magic: &[u8]) -> Result<(), ReadError> {
	if magic != &MAGIC[..magic.len()] {
		return Err(ReadError::InvalidFormat(format!("expected magic {:?}, found {:?}", String::from_utf8_lossy(&MAGIC), String::from_utf8_lossy(magic))));
	}

	Ok(())
}

fn read_region<R>(inner: &mut R, region: &'static str, len: u64) -> Result<Vec<u8>, ReadError>
where
	R: Read,
{
	let mut buf = Vec::new();

	inner.by_ref().take(len).read_to_end(&mut buf)?;

	if (buf.len() as u64) < len {
		return Err(ReadError::TruncatedInput {
			region,
			entry: None,
			expected: len,
			available: buf.len() as u64,
		});
	}

	Ok(buf)
}

fn read_length<R>(inner: &mut R, region: &'static str, total: u64) -> Result<u64, ReadError>
where
	R: Read + Seek,
{
	let start = inner.stream_position()?;

	match varint::read(inner) {
		Ok(Some(len)) => Ok(len),
		Ok(None) => Err(ReadError::TruncatedInput {
			region,
			entry: None,
			expected: 1,
			available: 0,
		}),
		Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
			let available = total.saturating_sub(start);

			Err(ReadError::TruncatedInput {
				region,
				entry: None,
				expected: available + 1,
				available,
			})
		}
		Err(err) if err.kind() == io::ErrorKind::InvalidData => Err(ReadError::InvalidFormat(format!("{region} at {start}: {err}"))),
		Err(err) => Err(err.into()),
	}
}

fn parse_records(table: &[u8]) -> Result<Vec<Record>, ReadError> {
	let mut records: Vec<Record> = Vec::new();
	let mut pos = 0;

	while pos < table.len() {
		let index = records.len();

		// Stop at the end of the region, however a record must never be split.

		let Some(name_off) = next_field(table, &mut pos, index)? else {
			break;
		};

		let incomplete = || truncated_table(table, index);

		let off = next_field(table, &mut pos, index)?.ok_or_else(incomplete)?;
		let len = next_field(table, &mut pos, index)?.ok_or_else(incomplete)?;

		records.push(Record {
			name_off,
			off,
			len,
		});
	}

	Ok(records)
}

fn next_field(table: &[u8], pos: &mut usize, index: usize) -> Result<Option<u64>, ReadError> {
	match varint::decode(&table[*pos..]) {
		Ok(Some((value, len))) => {
			*pos += len;

			Ok(Some(value))
		}
		Ok(None) => Ok(None),
		Err(VarIntError::Truncated) => Err(truncated_table(table, index)),
		Err(err @ VarIntError::Overflow) => Err(ReadError::InvalidFormat(format!("entry table field at {} of entry #{index}: {err}", *pos))),
	}
}

/// Reports an entry table that ends partway through the record of entry `index`.
fn truncated_table(table: &[u8], index: usize) -> ReadError {
	ReadError::TruncatedInput {
		region: "entry table",
		entry: Some(index),
		expected: table.len() as u64 + 1,
		available: table.len() as u64,
	}
}

fn decode_name(mut data: &[u8], index: usize) -> Result<String, ReadError> {
	let mut name = String::new();

	loop {
		let decoded = varint::decode(data).map_err(|err: VarIntError| ReadError::InvalidEntry {
			index,
			reason: format!("filename {err}"),
		})?;

		let Some((code, len)) = decoded else {
			break;
		};

		let ch = u32::try_from(code).ok().and_then(char::from_u32).ok_or_else(|| ReadError::InvalidEntry {
			index,
			reason: format!("invalid code point {code:#x} in filename"),
		})?;

		name.push(ch);
		data = &data[len..];
	}

	Ok(name)
}
