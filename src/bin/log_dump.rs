//! Prints the entries of a dump file written by `arsenal::dump::file_dump`.
//!
//! ```sh
//! log_dump dump.bin
//! log_dump --filename /tmp/session.bin
//! ```

use std::process::ExitCode;

use arsenal::dump::{DumpReader, DEFAULT_DUMP_FILE};
use arsenal::hexdump::hexdump;
use clap::{Arg, Command};
use tracing::{debug, error};

fn main() -> ExitCode {
    let matches = Command::new("log_dump")
        .about("Log file dumper")
        .version(arsenal::VERSION)
        .arg(
            Arg::new("filename")
                .short('f')
                .long("filename")
                .default_value(DEFAULT_DUMP_FILE)
                .help("Name of the log dump file"),
        )
        .arg(
            Arg::new("file")
                .index(1)
                .required(false)
                .help("Name of the log dump file, overrides --filename"),
        )
        .get_matches();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::WARN)
        .init();

    let filename = matches
        .get_one::<String>("file")
        .or_else(|| matches.get_one::<String>("filename"))
        .cloned()
        .unwrap_or_else(|| DEFAULT_DUMP_FILE.to_owned());

    let reader = match DumpReader::open(&filename) {
        Ok(reader) => reader,
        Err(err) => {
            error!(file = %filename, error = %err, "cannot open dump file");
            return ExitCode::FAILURE;
        }
    };

    let mut count = 0usize;
    for entry in reader {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                error!(file = %filename, entries = count, error = %err, "corrupt dump entry");
                return ExitCode::FAILURE;
            }
        };
        println!(
            "*** BLOB {} bytes *** {}: {}",
            entry.data.len(),
            entry.timestamp,
            entry.comment
        );
        print!("{}", hexdump(&entry.data));
        count += 1;
    }

    debug!(file = %filename, entries = count, "done");
    ExitCode::SUCCESS
}
