use std::path::Path;
use std::str::FromStr;

use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use crate::config::Logging;

/// Parse a level name, falling back to `Info` for anything unrecognized.
pub fn parse_level(level: &str) -> LevelFilter {
    LevelFilter::from_str(level.trim()).unwrap_or(LevelFilter::Info)
}

/// Install a file logger appending to the configured log file.
/// Best-effort: failures are silently ignored (logging must never block the shell).
///
/// `level_override` takes precedence over the configured level.
pub fn init(settings: &Logging, level_override: Option<&str>) {
    let Some(path) = settings.file_path() else {
        return;
    };
    let level = parse_level(level_override.unwrap_or(&settings.level));
    if level == LevelFilter::Off {
        return;
    }
    let _ = init_at(&path, level);
}

fn init_at(path: &Path, level: LevelFilter) -> Option<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).ok()?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .ok()?;

    let config = ConfigBuilder::new()
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build();
    WriteLogger::init(level, config, file).ok()
}
