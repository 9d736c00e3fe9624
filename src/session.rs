use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::models::SessionState;

/// Whole-record persistence of [`SessionState`] as JSON.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A missing file is an empty session.
    pub fn load(&self) -> Result<SessionState> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(file = %self.path.display(), "no stored session");
                Ok(SessionState::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Writes a sibling tmp file, syncs it and renames it over the target, so
    /// an interrupted save leaves the previous session intact.
    pub fn save(&self, state: &SessionState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.tmp_path();
        let mut file = File::create(&tmp)?;
        file.write_all(&serde_json::to_vec(state)?)?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "session".into());
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}

/// Prefixes `https://` unless the input already names an http(s) scheme.
pub fn normalize_domain(domain: &str) -> String {
    let domain = domain.trim();
    if domain.starts_with("http://") || domain.starts_with("https://") {
        domain.to_string()
    } else {
        format!("https://{domain}")
    }
}

impl SessionState {
    /// Stores the domain. A different domain than the stored one drops the token.
    pub fn set_domain(&mut self, domain: &str) {
        let domain = normalize_domain(domain);
        if self.domain.as_deref().is_some_and(|old| old != domain) && self.token.is_some() {
            info!(%domain, "domain changed, clearing token");
            self.token = None;
        }
        self.domain = Some(domain);
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn set_comment(&mut self, comment: &str) {
        self.comment = Some(comment.to_string());
    }

    /// Domain to authenticate against.
    pub fn require_domain(&self) -> Result<&str> {
        self.domain
            .as_deref()
            .filter(|d| !d.is_empty())
            .ok_or_else(|| ClientError::Configuration("Moodle domain not set, run set_domain".into()))
    }

    /// `(domain, token)` for an authenticated call.
    pub fn credentials(&self) -> Result<(&str, &str)> {
        if !self.is_authenticated() {
            return Err(ClientError::NotAuthenticated);
        }
        let domain = self.require_domain()?;
        Ok((domain, self.token.as_deref().unwrap_or_default()))
    }

    pub fn require_course(&self) -> Result<i64> {
        self.course_id.ok_or(ClientError::NoCourseSelected)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(domain) = &self.domain {
            writeln!(f, "domain: \"{domain}\"")?;
        }
        if self.is_authenticated() {
            writeln!(f, "Authenticated")?;
        } else {
            writeln!(f, "NOT AUTHENTICATED")?;
        }
        if let Some(user) = &self.user {
            let json = serde_json::to_string_pretty(user).map_err(|_| fmt::Error)?;
            writeln!(f, "{json}")?;
        }
        if let Some(course_id) = self.course_id {
            writeln!(f, "course_id: {course_id}")?;
        }
        if let Some(comment) = &self.comment {
            writeln!(f, "default comment: \"{comment}\"")?;
        }
        Ok(())
    }
}
