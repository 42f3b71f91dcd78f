//! Activity log of control actions
//!
//! One human-readable line per action, appended to a file that is rotated to
//! `<file>.1` once it reaches the size limit. Writes are blocking file I/O;
//! async callers run them through `spawn_blocking`.

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};
use chrono::{DateTime, Datelike, Local, TimeZone};
use tracing::warn;

use crate::state::CountdownLength;

/// Default size at which the log is rotated.
pub const DEFAULT_MAX_BYTES: u64 = 1024 * 1024;

const SOURCE: &str = "api";

#[derive(Debug)]
pub struct ActivityLog {
    path: Option<PathBuf>,
    max_bytes: u64,
    write_lock: Mutex<()>,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_max_bytes(path, DEFAULT_MAX_BYTES)
    }

    pub fn with_max_bytes(path: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            path: Some(path.into()),
            max_bytes,
            write_lock: Mutex::new(()),
        }
    }

    /// A log that records nothing.
    pub fn disabled() -> Self {
        Self {
            path: None,
            max_bytes: DEFAULT_MAX_BYTES,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append a line. Failures are logged, never returned.
    pub fn record(&self, line: &str) {
        let Some(path) = &self.path else { return };
        let Ok(_guard) = self.write_lock.lock() else {
            warn!("Activity log lock poisoned, dropping entry");
            return;
        };
        if let Err(e) = self.append(path, line) {
            warn!("Failed to write activity log {}: {}", path.display(), e);
        }
    }

    fn append(&self, path: &Path, line: &str) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        self.rotate_if_needed(path)?;

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", line)
    }

    fn rotate_if_needed(&self, path: &Path) -> io::Result<()> {
        match fs::metadata(path) {
            Ok(meta) if meta.len() >= self.max_bytes => {
                let mut rotated = path.as_os_str().to_owned();
                rotated.push(".1");
                let rotated = PathBuf::from(rotated);
                // rename only overwrites on unix
                if rotated.exists() {
                    fs::remove_file(&rotated)?;
                }
                fs::rename(path, rotated)
            }
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn timer_set(&self, ip: &str, length: CountdownLength) {
        self.record(&format!(
            "{} set a {} timer via {} on {}",
            ip,
            format_duration(length),
            SOURCE,
            format_timestamp(&Local::now())
        ));
    }

    pub fn paused(&self, ip: &str) {
        self.record(&format!("{} paused timer via {} on {}", ip, SOURCE, format_timestamp(&Local::now())));
    }

    pub fn resumed(&self, ip: &str) {
        self.record(&format!("{} resumed timer via {} on {}", ip, SOURCE, format_timestamp(&Local::now())));
    }

    pub fn reset(&self, ip: &str) {
        self.record(&format!("{} reset timer via {} on {}", ip, SOURCE, format_timestamp(&Local::now())));
    }

    pub fn access_denied(&self, ip: &str, endpoint: &str) {
        self.record(&format!(
            "{} accessed {} (denied) via {} on {}",
            ip,
            endpoint,
            SOURCE,
            format_timestamp(&Local::now())
        ));
    }
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 { format!("{} {}", n, unit) } else { format!("{} {}s", n, unit) }
}

/// `1 hour 30 minutes`, omitting zero parts.
pub fn format_duration(length: CountdownLength) -> String {
    let parts: Vec<String> = [(length.hours, "hour"), (length.minutes, "minute"), (length.seconds, "second")]
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| plural(n, unit))
        .collect();

    if parts.is_empty() {
        "0 seconds".to_string()
    } else {
        parts.join(" ")
    }
}

/// `January 1st 2026 09:05:00`
pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let day = at.day();
    let suffix = match day {
        1 | 21 | 31 => "st",
        2 | 22 => "nd",
        3 | 23 => "rd",
        _ => "th",
    };
    format!("{} {}{} {}", at.format("%B"), day, suffix, at.format("%Y %H:%M:%S"))
}
