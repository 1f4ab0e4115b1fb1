use std::{
	ffi::OsString,
	fs::{self, File},
	io::{self, BufReader, BufWriter, Write},
	path::{Component, Path, PathBuf},
};

use log::{debug, info, warn};
use tempfile::NamedTempFile;

use crate::{
	error::{Error, ReadError},
	manifest::Manifest,
	read::{Entry, Reader},
	write::Writer,
	EXTENSION, MANIFEST_NAME,
};

/// Represents the outcome of unpacking an archive.
#[derive(Debug, Clone)]
pub struct UnpackReport {
	/// The identifier of the archive.
	pub id: u32,

	/// The directory the entries were written to.
	pub output: PathBuf,

	/// The number of entries written.
	pub entries: usize,

	/// The total number of payload bytes written.
	pub bytes: u64,
}

/// Represents the outcome of packing a directory.
#[derive(Debug, Clone)]
pub struct PackReport {
	/// The identifier of the archive.
	pub id: u32,

	/// The archive that was written.
	pub output: PathBuf,

	/// The number of entries written, including those with missing sources.
	pub entries: usize,

	/// The total number of payload bytes written.
	pub bytes: u64,

	/// The names of entries whose source file was missing and were written empty.
	pub missing: Vec<String>,
}

/// Returns the directory an archive is unpacked to by default: the archive path without its extension.
pub fn default_unpack_dir(archive: &Path) -> PathBuf {
	archive.with_extension("")
}

/// Returns the archive a directory is packed to by default: a sibling named after the directory.
///
/// The directory is resolved first, so `.` and `..` name the directory they refer to.
pub fn default_pack_path(dir: &Path) -> io::Result<PathBuf> {
	let dir = dir.canonicalize()?;
	let mut name = dir.file_name().map(OsString::from).unwrap_or_else(|| OsString::from("archive"));

	name.push(".");
	name.push(EXTENSION);

	Ok(dir.with_file_name(name))
}

/// Resolves an entry name against `root`, treating both `/` and `\` as separators.
///
/// Names that are absolute, empty, or would leave `root` are rejected.
pub fn entry_path(root: &Path, name: &str) -> Result<PathBuf, Error> {
	let unsafe_path = || Error::UnsafePath(name.to_string());

	if name.starts_with(['/', '\\']) {
		return Err(unsafe_path());
	}

	let mut path = root.to_path_buf();
	let mut depth = 0;

	for part in name.split(['/', '\\']) {
		match part {
			"" | "." => continue,
			".." => return Err(unsafe_path()),
			_ if !Path::new(part).components().all(|c| matches!(c, Component::Normal(_))) => return Err(unsafe_path()),
			_ => {
				path.push(part);
				depth += 1;
			}
		}
	}

	if depth == 0 {
		return Err(unsafe_path());
	}

	Ok(path)
}

/// Reads the table of the archive at `path` without extracting anything.
pub fn list(path: &Path) -> Result<(u32, Vec<Entry>), Error> {
	let mut file = BufReader::new(File::open(path)?);
	let archive = Reader::new(&mut file).read()?;

	Ok((archive.id(), archive.into_entries()))
}

/// Unpacks the archive at `path` into `output`, or its default directory, along with its file list.
///
/// The whole table is read and every name resolved before anything is written.
pub fn unpack(path: &Path, output: Option<&Path>) -> Result<UnpackReport, Error> {
	info!("Unpacking <{}>...", path.display());

	let mut file = BufReader::new(File::open(path)?);
	let mut archive = Reader::new(&mut file).read()?;

	let output = output.map(Path::to_path_buf).unwrap_or_else(|| default_unpack_dir(path));
	let targets = archive.iter().map(|entry| entry_path(&output, &entry.name)).collect::<Result<Vec<_>, _>>()?;

	let count = archive.len();

	info!("Found {count} entries.");

	fs::create_dir_all(&output)?;

	let names: Vec<String> = archive.iter().map(|entry| entry.name.clone()).collect();
	let mut bytes = 0;

	for (index, (name, target)) in names.iter().zip(&targets).enumerate() {
		if let Some(parent) = target.parent() {
			fs::create_dir_all(parent)?;
		}

		let mut open = archive.open(index).ok_or_else(|| ReadError::InvalidEntry {
			index,
			reason: "no such entry".into(),
		})?;

		let mut out = BufWriter::new(File::create(target)?);

		bytes += io::copy(&mut open, &mut out)?;
		out.flush()?;

		info!("[{:04}/{:04}] {}", index + 1, count, name);
	}

	let manifest = Manifest::new(archive.id(), names);
	let manifest_path = output.join(MANIFEST_NAME);

	manifest.save(&manifest_path)?;

	debug!("wrote file list <{}>", manifest_path.display());
	info!("Unpacked {count} entries to <{}>.", output.display());

	Ok(UnpackReport {
		id: archive.id(),
		output,
		entries: count,
		bytes,
	})
}

/// Packs `dir` into `output`, or its default archive, following the order of its file list.
///
/// A listed file that does not exist is written as an empty entry and reported, rather than aborting.
pub fn pack(dir: &Path, output: Option<&Path>) -> Result<PackReport, Error> {
	info!("Packing <{}>...", dir.display());

	let manifest = Manifest::load(&dir.join(MANIFEST_NAME))?;
	let output = match output {
		Some(output) => output.to_path_buf(),
		None => default_pack_path(dir)?,
	};

	let count = manifest.names.len();

	info!("Found {count} entries to pack.");

	let mut writer = Writer::new(manifest.id);
	let mut missing = Vec::new();
	let mut bytes = 0;

	for (index, name) in manifest.names.iter().enumerate() {
		let source = entry_path(dir, name)?;

		info!("[{:04}/{:04}] {}", index + 1, count, name);

		match File::open(&source) {
			Ok(file) => {
				bytes += writer.write(name, &mut BufReader::new(file))?;
			}
			Err(err) if err.kind() == io::ErrorKind::NotFound => {
				warn!("File not found, writing empty entry: {name}");

				writer.write(name, &mut io::empty())?;
				missing.push(name.clone());
			}
			Err(err) => return Err(err.into()),
		}
	}

	// Write next to the destination, then move into place, so a failure never leaves a partial archive.

	let parent = output.parent().filter(|parent| !parent.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
	let mut temp = NamedTempFile::new_in(parent)?;

	writer.finish(&mut BufWriter::new(temp.as_file_mut()))?;
	temp.persist(&output).map_err(|err| err.error)?;

	info!("Packed {count} entries to <{}>.", output.display());

	Ok(PackReport {
		id: manifest.id,
		output,
		entries: count,
		bytes,
		missing,
	})
}

#[cfg(test)]
mod tests {
	use std::{fs, path::Path};

	use crate::error::Error;

	use super::{default_pack_path, default_unpack_dir, entry_path};

	#[test]
	fn test_entry_path() {
		let root = Path::new("out");

		assert_eq!(entry_path(root, "a.txt").unwrap(), root.join("a.txt"));
		assert_eq!(entry_path(root, "bg/title.png").unwrap(), root.join("bg").join("title.png"));
		assert_eq!(entry_path(root, "bg\\title.png").unwrap(), root.join("bg").join("title.png"));
		assert_eq!(entry_path(root, "bg//./title.png").unwrap(), root.join("bg").join("title.png"));
	}

	#[test]
	fn test_entry_path_unsafe() {
		let root = Path::new("out");

		for name in ["", "/etc/passwd", "\\windows", "../escape", "a/../../b", "a\\..\\b", "./."] {
			assert!(matches!(entry_path(root, name), Err(Error::UnsafePath(_))), "accepted {name:?}");
		}
	}

	#[test]
	fn test_default_paths() {
		let dir = tempfile::tempdir().expect("failed to create directory");
		let root = dir.path().canonicalize().expect("failed to resolve directory");

		fs::create_dir_all(root.join("script")).expect("failed to create directory");
		fs::create_dir_all(root.join("bg.v2")).expect("failed to create directory");

		assert_eq!(default_unpack_dir(Path::new("data/script.iga")), Path::new("data/script"));
		assert_eq!(default_pack_path(&root.join("script")).unwrap(), root.join("script.iga"));
		assert_eq!(default_pack_path(&root.join("script").join("")).unwrap(), root.join("script.iga"));
		assert_eq!(default_pack_path(&root.join("bg.v2")).unwrap(), root.join("bg.v2.iga"));
	}

	#[test]
	fn test_default_pack_path_relative() {
		let dir = tempfile::tempdir().expect("failed to create directory");
		let root = dir.path().canonicalize().expect("failed to resolve directory");

		fs::create_dir_all(root.join("script")).expect("failed to create directory");

		// The archive must land beside the directory, never inside it.

		assert_eq!(default_pack_path(&root.join("script").join(".")).unwrap(), root.join("script.iga"));
		assert_eq!(default_pack_path(&root.join("script").join("..").join("script")).unwrap(), root.join("script.iga"));
	}
}
