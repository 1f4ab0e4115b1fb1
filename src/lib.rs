//! Library for reading from/writing to `IGA` archives used by Innocent Grey games.
//!
//! An archive is a 16-byte header followed by a varint-encoded entry table, a block of
//! varint-encoded filenames and the XOR-obfuscated payloads of each entry.

use std::io::{Read, Seek};

/// Contains types for errors.
pub mod error;

/// Contains helpers for unpacking archives to, and packing archives from, directories.
pub mod fs;

/// Contains the file list that records the identifier and entry order of an unpacked archive.
pub mod manifest;

/// Contains types and the accompanying logic for reading from archives.
pub mod read;

/// Contains the variable-length integer encoding used for every length and offset.
pub mod varint;

/// Contains types and the accompanying logic for writing to archives.
pub mod write;

/// Contains the position-dependent obfuscation applied to payloads.
pub mod xor;

/// Represents the structure of the header magic.
pub const MAGIC: [u8; 4] = *b"IGA0";

/// Represents the number of bytes of the fixed-width header.
pub const HEADER_SIZE: u64 = 16;

/// Represents the value of both reserved header fields, as observed in every known archive.
pub const RESERVED_FIELD: u32 = 2;

/// Represents the conventional extension of archives.
pub const EXTENSION: &str = "iga";

/// Represents the name of the file list written alongside unpacked entries.
pub const MANIFEST_NAME: &str = "iga_filelist.txt";

/// Reads the archive table from `inner`, leaving the payloads to be opened on demand.
pub fn read<R>(inner: &mut R) -> Result<read::Archive<'_, R>, error::ReadError>
where
	R: Read + Seek,
{
	read::Reader::new(inner).read()
}
