use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SERVICE: &str = "moodle_mobile_app";

/// Process-level settings. Every value has a working-directory default.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub session_file: PathBuf,
    pub downloads_dir: PathBuf,
    pub audit_log: PathBuf,
    pub service: String,
    pub timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session_file: PathBuf::from("config.json"),
            downloads_dir: PathBuf::from("downloads"),
            audit_log: PathBuf::from("auto-grade.log"),
            service: DEFAULT_SERVICE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            session_file: env::var("RUSTIMOODLE_CONFIG")
                .map(PathBuf::from)
                .unwrap_or(defaults.session_file),
            downloads_dir: env::var("RUSTIMOODLE_DOWNLOADS")
                .map(PathBuf::from)
                .unwrap_or(defaults.downloads_dir),
            audit_log: env::var("RUSTIMOODLE_AUDIT_LOG")
                .map(PathBuf::from)
                .unwrap_or(defaults.audit_log),
            service: env::var("RUSTIMOODLE_SERVICE").unwrap_or(defaults.service),
            timeout: env::var("RUSTIMOODLE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}
