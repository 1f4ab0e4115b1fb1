use std::{fs, process::Command};

use tempfile::tempdir;

fn bin() -> String {
	env!("CARGO_BIN_EXE_iga").to_string()
}

#[test]
fn cli_pack_unpack_roundtrip() {
	let dir = tempdir().unwrap();
	let source = dir.path().join("game");

	fs::create_dir_all(source.join("sound")).unwrap();
	fs::write(source.join("sound").join("se01.ogg"), b"OggS fake").unwrap();
	fs::write(source.join("iga_filelist.txt"), "[2]\nsound/se01.ogg").unwrap();

	let status = Command::new(bin()).arg(&source).status().unwrap();

	assert!(status.success());
	assert!(dir.path().join("game.iga").exists());

	fs::remove_dir_all(&source).unwrap();

	let status = Command::new(bin()).arg(dir.path().join("game.iga")).status().unwrap();

	assert!(status.success());
	assert_eq!(fs::read(source.join("sound").join("se01.ogg")).unwrap(), b"OggS fake");
	assert_eq!(fs::read_to_string(source.join("iga_filelist.txt")).unwrap(), "[2]\nsound/se01.ogg");
}

#[test]
fn cli_list() {
	let dir = tempdir().unwrap();
	let archive = dir.path().join("list.IGA");

	fs::write(&archive, iga::write::build(5, &[("a.txt", &b"abc"[..])]).unwrap()).unwrap();

	let output = Command::new(bin()).arg("--list").arg(&archive).output().unwrap();

	assert!(output.status.success());

	let stdout = String::from_utf8(output.stdout).unwrap();

	assert!(stdout.contains("Archive identifier: 5"));
	assert!(stdout.contains("a.txt"));
	assert!(!dir.path().join("list").exists());
}

#[test]
fn cli_rejects_other_paths() {
	let dir = tempdir().unwrap();
	let other = dir.path().join("notes.txt");

	fs::write(&other, b"not an archive").unwrap();

	assert!(!Command::new(bin()).arg(&other).status().unwrap().success());
	assert!(!Command::new(bin()).arg(dir.path().join("missing.iga")).status().unwrap().success());
}

#[test]
fn cli_invalid_archive_fails() {
	let dir = tempdir().unwrap();
	let archive = dir.path().join("broken.iga");

	fs::write(&archive, b"XXXX\x02\x00\x00\x00\x02\x00\x00\x00\x02\x00\x00\x00\x01\x01").unwrap();

	let output = Command::new(bin()).arg(&archive).output().unwrap();

	assert!(!output.status.success());
	assert!(!dir.path().join("broken").exists());
}
