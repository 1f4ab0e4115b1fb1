//! Command-line application for unpacking and repacking IGA archives.

use std::{io::Write, path::PathBuf, process};

use clap::{ArgAction, Parser};
use iga::{error::Error, fs, EXTENSION, MANIFEST_NAME};
use log::{error, warn, Level, LevelFilter};

/// Unpacks an IGA archive into a directory, or packs such a directory back into an archive
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
	/// Specifies an `.iga` archive to unpack, or a directory containing `iga_filelist.txt` to pack
	path: PathBuf,

	/// Specifies the output directory when unpacking, or the output archive when packing
	#[arg(short, long)]
	output: Option<PathBuf>,

	/// Lists the entries of the archive instead of unpacking it
	#[arg(short, long)]
	list: bool,

	/// Increases the detail of the output (repeatable)
	#[arg(short, long, action = ArgAction::Count)]
	verbose: u8,

	/// Suppresses all output but errors
	#[arg(short, long, conflicts_with = "verbose")]
	quiet: bool,
}

/// Represents the operation implied by the input path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
	Unpack,
	List,
	Pack,
}

fn main() {
	let cli = Cli::parse();

	init_logger(&cli);

	// Ascertain the operation based on the input path.

	let is_archive = cli.path.is_file() && cli.path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case(EXTENSION));

	let operation = match (is_archive, cli.path.is_dir(), cli.list) {
		(true, _, false) => Operation::Unpack,
		(true, _, true) => Operation::List,
		(false, true, false) => Operation::Pack,
		(false, true, true) => usage(&format!("--list requires an .{EXTENSION} archive, not a directory: <{}>", cli.path.display())),
		(false, false, _) => usage(&format!("not an .{EXTENSION} archive or a directory: <{}>", cli.path.display())),
	};

	if let Err(err) = run(operation, &cli) {
		error!("{err}");
		process::exit(1);
	}
}

fn run(operation: Operation, cli: &Cli) -> Result<(), Error> {
	match operation {
		Operation::Unpack => {
			fs::unpack(&cli.path, cli.output.as_deref())?;
		}
		Operation::List => {
			let (id, entries) = fs::list(&cli.path)?;

			println!("Archive identifier: {id}");

			for entry in &entries {
				println!("[{:<24}] offset: {}, length: {}", entry.name, entry.off, entry.len);
			}

			println!("Listed {} entries.", entries.len());
		}
		Operation::Pack => {
			let report = fs::pack(&cli.path, cli.output.as_deref())?;

			if !report.missing.is_empty() {
				warn!("{} of {} entries listed in {MANIFEST_NAME} were missing and packed empty.", report.missing.len(), report.entries);
			}
		}
	}

	Ok(())
}

fn init_logger(cli: &Cli) {
	let level = match (cli.quiet, cli.verbose) {
		(true, _) => LevelFilter::Error,
		(false, 0) => LevelFilter::Info,
		(false, 1) => LevelFilter::Debug,
		(false, _) => LevelFilter::Trace,
	};

	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()))
		.format(|buf, record| match record.level() {
			Level::Info => writeln!(buf, "{}", record.args()),
			level => writeln!(buf, "{}: {}", level.as_str().to_lowercase(), record.args()),
		})
		.init();
}

fn usage(message: &str) -> ! {
	error!("{message}");
	eprintln!("Usage: iga [OPTIONS] <PATH>  (see --help)");
	process::exit(1);
}
