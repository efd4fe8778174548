use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

const LOG_FILE: &str = "session.log";
const ROTATED_EXTENSION: &str = "log.1";
const MAX_LOG_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    TokenCheck,
    TokenRefreshStart,
    TokenRefreshSuccess,
    TokenRefreshFailed,
    RefreshLockAcquired,
    RefreshLockReleased,
    CredentialsSaved,
    CredentialsDeleted,
    SignupComplete,
    ApiError,
    PhonePayloadDumped,
}

/// One log line. Blank or absent fields are left out.
#[derive(Serialize)]
struct LogRecord<'a> {
    timestamp: String,
    event: SessionEvent,
    #[serde(flatten)]
    fields: IndexMap<&'a str, &'a str>,
}

impl<'a> LogRecord<'a> {
    fn new(event: SessionEvent, fields: &'a [(&'a str, Option<String>)]) -> Self {
        let fields = fields
            .iter()
            .filter_map(|(key, value)| {
                let value = value.as_deref()?.trim();
                (!value.is_empty()).then_some((*key, value))
            })
            .collect();
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            event,
            fields,
        }
    }
}

/// JSON-lines session log under the data directory.
pub struct SessionLogWriter {
    path: PathBuf,
    max_bytes: u64,
}

impl SessionLogWriter {
    pub fn new(log_dir: PathBuf) -> Self {
        Self {
            path: log_dir.join(LOG_FILE),
            max_bytes: MAX_LOG_BYTES,
        }
    }

    /// Never fails the caller; a record that cannot be written is dropped.
    pub fn write(&self, event: SessionEvent, fields: &[(&str, Option<String>)]) {
        let record = LogRecord::new(event, fields);
        if let Ok(line) = serde_json::to_string(&record) {
            let _ = self.append(&line);
        }
    }

    fn append(&self, line: &str) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let oversized = fs::metadata(&self.path)
            .map(|metadata| metadata.len() > self.max_bytes)
            .unwrap_or(false);
        if oversized {
            let rotated = self.path.with_extension(ROTATED_EXTENSION);
            let _ = fs::remove_file(&rotated);
            fs::rename(&self.path, rotated)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        restrict_permissions(&file);
        writeln!(file, "{}", line)
    }
}

#[cfg(unix)]
pub fn restrict_permissions(file: &fs::File) {
    use std::os::unix::fs::PermissionsExt;
    let _ = file.set_permissions(fs::Permissions::from_mode(0o600));
}

#[cfg(not(unix))]
pub fn restrict_permissions(_file: &fs::File) {}

pub fn short_hash_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    hex::encode(digest)[..16].to_string()
}

pub fn token_fingerprint(token: &str) -> Option<String> {
    let raw = token.trim();
    if raw.is_empty() {
        return None;
    }
    Some(short_hash_hex(raw.as_bytes()))
}
