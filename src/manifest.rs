use std::{
	fmt::{self, Display},
	fs, io,
	path::Path,
	str::FromStr,
};

use crate::error::ManifestError;

/// Represents the file list of an unpacked archive: its identifier and the names of its entries in table order.
#[derive(Debug, Clone, Default, Hash, Eq, PartialEq)]
pub struct Manifest {
	/// The identifier of the archive.
	pub id: u32,

	/// The names of the entries, in the order they appear in the entry table.
	pub names: Vec<String>,
}

impl Manifest {
	/// Creates a new manifest with the specified identifier and names.
	pub fn new(id: u32, names: Vec<String>) -> Self {
		Self {
			id,
			names,
		}
	}

	/// Reads and parses the manifest at `path`.
	pub fn load(path: &Path) -> Result<Self, ManifestError> {
		let text = fs::read_to_string(path).map_err(|err| match err.kind() {
			io::ErrorKind::NotFound => ManifestError::Missing(path.to_path_buf()),
			_ => ManifestError::IoError(err),
		})?;

		text.parse()
	}

	/// Writes the manifest to `path`, replacing any existing file.
	pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
		fs::write(path, self.to_string())?;

		Ok(())
	}
}

impl FromStr for Manifest {
	type Err = ManifestError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		// Skip blank lines, however keep the original line numbers for errors.

		let mut lines = s.strip_prefix('\u{feff}').unwrap_or(s).lines().enumerate().map(|(i, line)| (i + 1, line.trim())).filter(|(_, line)| !line.is_empty());

		let (line, first) = lines.next().ok_or(ManifestError::Empty)?;

		let id = first
			.strip_prefix('[')
			.and_then(|rest| rest.strip_suffix(']'))
			.and_then(|id| id.trim().parse().ok())
			.ok_or(ManifestError::MalformedId {
				line,
			})?;

		let names = lines.map(|(_, name)| name.to_string()).collect();

		Ok(Self {
			id,
			names,
		})
	}
}

impl Display for Manifest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}]", self.id)?;

		for name in &self.names {
			write!(f, "\n{}", name)?;
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use crate::error::ManifestError;

	use super::Manifest;

	#[test]
	fn test_parse() {
		let manifest: Manifest = "[2]\nscript/main.s\nbg\\title.png\n".parse().expect("failed to parse manifest");

		assert_eq!(manifest.id, 2);
		assert_eq!(manifest.names, vec!["script/main.s", "bg\\title.png"]);
	}

	#[test]
	fn test_parse_windows() {
		let manifest: Manifest = "\u{feff}[14]\r\n\r\na.txt\r\n  b.txt  \r\n".parse().expect("failed to parse manifest");

		assert_eq!(manifest.id, 14);
		assert_eq!(manifest.names, vec!["a.txt", "b.txt"]);
	}

	#[test]
	fn test_parse_empty() {
		assert!(matches!("".parse::<Manifest>(), Err(ManifestError::Empty)));
		assert!(matches!("\n  \n".parse::<Manifest>(), Err(ManifestError::Empty)));
	}

	#[test]
	fn test_parse_malformed_id() {
		assert!(matches!(
			"\n2\na.txt".parse::<Manifest>(),
			Err(ManifestError::MalformedId {
				line: 2,
			})
		));
		assert!(matches!("[two]".parse::<Manifest>(), Err(ManifestError::MalformedId { .. })));
		assert!(matches!("[-1]".parse::<Manifest>(), Err(ManifestError::MalformedId { .. })));
	}

	#[test]
	fn test_display() {
		let manifest = Manifest::new(2, vec!["a.txt".into(), "b.txt".into()]);

		assert_eq!(manifest.to_string(), "[2]\na.txt\nb.txt");
		assert_eq!(Manifest::new(5, Vec::new()).to_string(), "[5]");
	}

	#[test]
	fn test_display_parse() {
		let manifest = Manifest::new(u32::MAX, vec!["一.txt".into(), "dir/二.bin".into()]);
		let parsed: Manifest = manifest.to_string().parse().expect("failed to parse manifest");

		assert_eq!(parsed, manifest);
	}

	#[test]
	fn test_load_missing() {
		let dir = tempfile::tempdir().expect("failed to create directory");
		let result = Manifest::load(&dir.path().join("iga_filelist.txt"));

		assert!(matches!(result, Err(ManifestError::Missing(_))));
	}
}
