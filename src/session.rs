//! Who is logged in. A [`Session`] is loaded once when the program starts,
//! handed to whatever needs it and written back after login or logout.

use crate::auth::{Admin, AdminToken, User};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserSession {
    pub user: User,
    pub logged_in_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdminSession {
    pub admin: Admin,
    pub token: AdminToken,
    pub logged_in_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSession>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<AdminSession>,
}

impl Session {
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref().map(|s| &s.user)
    }

    pub fn admin(&self) -> Option<&Admin> {
        self.admin.as_ref().map(|s| &s.admin)
    }

    pub fn admin_token(&self) -> Option<&AdminToken> {
        self.admin.as_ref().map(|s| &s.token)
    }

    pub fn login_user(&mut self, user: User) {
        self.user = Some(UserSession {
            user,
            logged_in_at: Utc::now(),
        });
    }

    pub fn login_admin(&mut self, admin: Admin, token: AdminToken) {
        self.admin = Some(AdminSession {
            admin,
            token,
            logged_in_at: Utc::now(),
        });
    }

    pub fn logout_user(&mut self) -> Option<User> {
        self.user.take().map(|s| s.user)
    }

    pub fn logout_admin(&mut self) -> Option<Admin> {
        self.admin.take().map(|s| s.admin)
    }
}

/// Where the session lives between runs.
#[derive(Clone, Debug)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or unreadable session file gives an empty session.
    pub fn load(&self) -> Session {
        debug!("Reading session from {}", self.path.display());
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Session::default(),
            Err(err) => {
                warn!("Couldn't read {}: {err}", self.path.display());
                return Session::default();
            }
        };
        serde_json::from_str(&contents).unwrap_or_else(|err| {
            warn!("Ignoring invalid session in {}: {err}", self.path.display());
            Session::default()
        })
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        let dir = self
            .path
            .parent()
            .context("Session path has no parent directory")?;
        fs::create_dir_all(dir)?;
        let json = serde_json::to_string_pretty(session)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        debug!("Wrote session to {}", self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Removed {}", self.path.display());
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
