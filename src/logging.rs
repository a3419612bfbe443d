//! File logging. The terminal belongs to the TUI, so nothing is written to
//! stdout or stderr while it runs.

use std::fs::File;
use std::path::Path;

use log::LevelFilter;
use simplelog::{Config, ConfigBuilder, ThreadLogMode, WriteLogger};

/// Install the global logger writing to `path` (truncated on start).
///
/// A log file that can't be created is reported on stderr and logging stays
/// off; the program still runs.
pub fn initialize(path: &Path, verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    match File::create(path) {
        Ok(file) => {
            let _ = WriteLogger::init(level, build_config(), file);
        }
        Err(err) => {
            eprintln!("Warning: Could not create log file at {}: {err}", path.display());
        }
    }
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .set_thread_level(LevelFilter::Error)
        .set_thread_mode(ThreadLogMode::Names)
        .build()
}
