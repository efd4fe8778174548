use crate::error::{CliError, CliResult};
use crate::eventlog::restrict_permissions;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// The single persisted account document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub device_id: String,
    pub phone_num: String,
    pub client_id: String,
    pub client_secret: String,
    pub token: String,
    pub refresh_token: String,
    pub services: IndexMap<String, ServiceRecord>,
}

impl Credentials {
    pub fn is_signed_up(&self) -> bool {
        !self.token.trim().is_empty()
    }

    /// Re-keys a service without moving it in the listing order.
    pub fn rename_service(&mut self, old_name: &str, new_name: &str) -> bool {
        let Some(index) = self.services.get_index_of(old_name) else {
            return false;
        };
        let Some(record) = self.services.shift_remove(old_name) else {
            return false;
        };
        let (new_index, _) = self.services.insert_full(new_name.to_string(), record);
        self.services.move_index(new_index, index);
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceRecord {
    pub service_type: String,
    pub service_id: String,
    pub package_category_id: String,
    pub credentials: IndexMap<String, String>,
}

pub struct CredentialStore {
    file_path: PathBuf,
}

impl CredentialStore {
    pub fn new(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn load(&self) -> CliResult<Credentials> {
        if !self.file_path.exists() {
            return Ok(Credentials::default());
        }

        let data = fs::read(&self.file_path).map_err(|err| {
            CliError::local_io(format!(
                "Couldn't read the credentials file at {}: {}",
                self.file_path.display(),
                err
            ))
        })?;
        serde_json::from_slice::<Credentials>(&data).map_err(|err| {
            CliError::local_io(format!(
                "The credentials file at {} is corrupted: {}",
                self.file_path.display(),
                err
            ))
        })
    }

    pub fn save(&self, credentials: &Credentials) -> CliResult<()> {
        let data =
            to_tab_json(credentials).map_err(|_| CliError::credentials_file(&self.file_path))?;
        write_file_atomic(&self.file_path, &data)
            .map_err(|_| CliError::credentials_file(&self.file_path))
    }

    pub fn delete(&self) -> CliResult<()> {
        match fs::remove_file(&self.file_path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(_) => Err(CliError::credentials_file(&self.file_path)),
        }
    }
}

/// Pretty JSON indented with tabs.
pub fn to_tab_json<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut data = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut data, formatter);
    value.serialize(&mut serializer)?;
    Ok(data)
}

fn write_file_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid target path: {}", path.display()),
        )
    })?;
    fs::create_dir_all(parent)?;

    let mut temp_file = NamedTempFile::new_in(parent)?;
    temp_file.write_all(data)?;
    temp_file.as_file().sync_all()?;
    restrict_permissions(temp_file.as_file());

    temp_file.persist(path).map_err(|err| err.error)?;
    Ok(())
}
