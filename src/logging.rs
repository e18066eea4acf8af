use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use env_logger::{Builder, Env, Target};

fn builder() -> Builder {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_secs().format_module_path(false);
    builder
}

/// Logs to stderr. Used in headless mode, where nothing else owns the terminal.
pub fn init_stderr() -> io::Result<()> {
    builder()
        .target(Target::Stderr)
        .try_init()
        .map_err(io::Error::other)
}

/// Logs to a fresh timestamped file under `folder` so the dashboard keeps the terminal.
pub fn init_file(folder: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(folder)?;
    let path = folder.join(log_file_name(Local::now()));
    let file = File::create(&path)?;
    builder()
        .target(Target::Pipe(Box::new(file)))
        .try_init()
        .map_err(io::Error::other)?;
    Ok(path)
}

fn log_file_name(at: DateTime<Local>) -> String {
    format!("log_{}.txt", at.format("%Y-%m-%d_%H-%M-%S"))
}
