use crate::api::{handle_response, require_text, value_text, LttApi};
use crate::error::{CliError, CliResult};
use crate::eventlog::{restrict_permissions, token_fingerprint, SessionEvent, SessionLogWriter};
use crate::store::{CredentialStore, Credentials};
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

const REFRESH_LOCK_FILE: &str = "token-refresh.lock";

/// Check-then-refresh protocol run before every authenticated call.
pub struct SessionManager<'a> {
    api: &'a dyn LttApi,
    store: &'a CredentialStore,
    log: &'a SessionLogWriter,
    lock_dir: PathBuf,
}

impl<'a> SessionManager<'a> {
    pub fn new(
        api: &'a dyn LttApi,
        store: &'a CredentialStore,
        log: &'a SessionLogWriter,
        lock_dir: PathBuf,
    ) -> Self {
        Self {
            api,
            store,
            log,
            lock_dir,
        }
    }

    pub fn is_valid(&self, token: &str) -> CliResult<bool> {
        let response = self.api.validate_token(token)?;
        let valid = response.is_success();
        self.log.write(
            SessionEvent::TokenCheck,
            &[
                ("token", token_fingerprint(token)),
                ("status", Some(response.status.to_string())),
                ("valid", Some(valid.to_string())),
            ],
        );
        Ok(valid)
    }

    /// Returns `credentials` untouched when its token still validates,
    /// otherwise a copy carrying a freshly refreshed and persisted pair.
    pub fn ensure_valid(&self, credentials: Credentials) -> CliResult<Credentials> {
        if self.is_valid(&credentials.token)? {
            return Ok(credentials);
        }

        println!("Updating token...");
        self.with_refresh_lock(|| self.refresh(credentials))
    }

    fn refresh(&self, mut credentials: Credentials) -> CliResult<Credentials> {
        self.log.write(
            SessionEvent::TokenRefreshStart,
            &[("refresh_token", token_fingerprint(&credentials.refresh_token))],
        );
        let body = self
            .api
            .refresh_token(
                &credentials.refresh_token,
                &credentials.client_id,
                &credentials.client_secret,
            )
            .and_then(handle_response)
            .and_then(|body| {
                let access_token = require_text(&body, &["access_token"])?;
                Ok((access_token, value_text(body.get("refresh_token"))))
            });
        let (access_token, refresh_token) = match body {
            Ok(pair) => pair,
            Err(err) => {
                self.log.write(
                    SessionEvent::TokenRefreshFailed,
                    &[("error", Some(err.message.clone()))],
                );
                return Err(err);
            }
        };

        credentials.token = access_token;
        if let Some(refresh_token) = refresh_token {
            credentials.refresh_token = refresh_token;
        }
        self.store.save(&credentials)?;
        self.log.write(
            SessionEvent::TokenRefreshSuccess,
            &[
                ("token", token_fingerprint(&credentials.token)),
                ("refresh_token", token_fingerprint(&credentials.refresh_token)),
            ],
        );
        Ok(credentials)
    }

    fn with_refresh_lock<T, F>(&self, operation: F) -> CliResult<T>
    where
        F: FnOnce() -> CliResult<T>,
    {
        fs::create_dir_all(&self.lock_dir).map_err(|err| {
            CliError::local_io(format!(
                "failed to create lock dir {}: {}",
                self.lock_dir.display(),
                err
            ))
        })?;

        let lock_path = self.lock_dir.join(REFRESH_LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|err| {
                CliError::local_io(format!(
                    "failed to open lock file {}: {}",
                    lock_path.display(),
                    err
                ))
            })?;
        restrict_permissions(&file);
        file.lock_exclusive().map_err(|err| {
            CliError::local_io(format!(
                "failed to acquire lock {}: {}",
                lock_path.display(),
                err
            ))
        })?;
        self.log.write(SessionEvent::RefreshLockAcquired, &[]);

        let result = operation();
        let result_label = if result.is_ok() { "success" } else { "error" };
        let _ = file.unlock();
        self.log.write(
            SessionEvent::RefreshLockReleased,
            &[("result", Some(result_label.to_string()))],
        );
        result
    }
}
