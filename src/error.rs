use std::{io, path::PathBuf};

use thiserror::Error;

/// Represents a read-related error.
#[derive(Debug, Error)]
pub enum ReadError {
	/// Indicates that a generic I/O error occurred.
	#[error("input/output error [{0}]")]
	IoError(#[from] io::Error),

	/// Indicates that the archive is not structurally valid, such as a mismatched magic.
	#[error("invalid format [{0}]")]
	InvalidFormat(String),

	/// Indicates that a region ended before its declared length.
	#[error("truncated {region}{}: expected {expected} bytes, {available} available", .entry.map(|index| format!(" of entry #{index}")).unwrap_or_default())]
	TruncatedInput {
		/// The region being read.
		region: &'static str,

		/// The zero-based position of the entry the region belongs to, if any.
		entry: Option<usize>,

		/// The number of bytes the region declared.
		expected: u64,

		/// The number of bytes actually present.
		available: u64,
	},

	/// Indicates that a single entry is inconsistent with the rest of the archive.
	#[error("invalid entry #{index} [{reason}]")]
	InvalidEntry {
		/// The zero-based position of the entry in the entry table.
		index: usize,

		/// A description of the inconsistency.
		reason: String,
	},
}

/// Represents a write-related error.
#[derive(Debug, Error)]
pub enum WriteError {
	/// Indicates that a generic I/O error occurred.
	#[error("input/output error [{0}]")]
	IoError(#[from] io::Error),

	/// Indicates that a length or offset cannot be represented by the archive format.
	#[error("{field} of {value} cannot be represented")]
	ValueTooLarge {
		/// The field being written.
		field: &'static str,

		/// The offending value.
		value: u64,
	},
}

/// Represents an error with the file list of an unpacked archive.
#[derive(Debug, Error)]
pub enum ManifestError {
	/// Indicates that the file list does not exist.
	#[error("file list not found at <{}>", .0.display())]
	Missing(PathBuf),

	/// Indicates that the file list contains no lines.
	#[error("file list is empty")]
	Empty,

	/// Indicates that the identifier line is not of the form `[<id>]`.
	#[error("malformed archive identifier on line {line}")]
	MalformedId {
		/// The one-based line number.
		line: usize,
	},

	/// Indicates that a generic I/O error occurred.
	#[error("input/output error [{0}]")]
	IoError(#[from] io::Error),
}

/// Represents any error raised while unpacking or packing directories.
#[derive(Debug, Error)]
pub enum Error {
	/// Indicates that the archive could not be read.
	#[error(transparent)]
	Read(#[from] ReadError),

	/// Indicates that the archive could not be written.
	#[error(transparent)]
	Write(#[from] WriteError),

	/// Indicates that the file list could not be read or written.
	#[error(transparent)]
	Manifest(#[from] ManifestError),

	/// Indicates that an entry name would resolve outside of the target directory.
	#[error("entry name escapes the target directory [{0}]")]
	UnsafePath(String),

	/// Indicates that a generic I/O error occurred.
	#[error("input/output error [{0}]")]
	IoError(#[from] io::Error),
}
