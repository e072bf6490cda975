use std::env;
use std::fmt;
use std::path::PathBuf;

/// Where the engine sources its versioned reference tables from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceSource {
    /// Compiled-in rule set, stamped with its release version.
    BuiltIn,
    /// A directory of CSV tables overriding the compiled-in set.
    Directory(PathBuf),
}

/// Top-level configuration for the extraction and analysis engines.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub reference: ReferenceSource,
    pub telemetry: TelemetryConfig,
}

impl EngineConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let reference = match env::var("TAXCASE_REFERENCE_DIR") {
            Ok(value) if !value.trim().is_empty() => {
                let path = PathBuf::from(value.trim());
                if !path.is_dir() {
                    return Err(ConfigError::ReferenceDirMissing { path });
                }
                ReferenceSource::Directory(path)
            }
            _ => ReferenceSource::BuiltIn,
        };

        let log_level = env::var("TAXCASE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            reference,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    ReferenceDirMissing { path: PathBuf },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReferenceDirMissing { path } => {
                write!(
                    f,
                    "TAXCASE_REFERENCE_DIR points at '{}', which is not a directory",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("TAXCASE_REFERENCE_DIR");
        env::remove_var("TAXCASE_LOG_LEVEL");
    }

    #[test]
    fn load_uses_builtin_tables_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = EngineConfig::load().expect("config loads with defaults");
        assert_eq!(config.reference, ReferenceSource::BuiltIn);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn load_rejects_missing_reference_dir() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("TAXCASE_REFERENCE_DIR", "/definitely/not/a/real/dir");
        let error = EngineConfig::load().expect_err("expected missing dir error");
        assert!(matches!(error, ConfigError::ReferenceDirMissing { .. }));
        reset_env();
    }

    #[test]
    fn load_accepts_existing_reference_dir() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let dir = tempfile::tempdir().expect("tempdir");
        env::set_var("TAXCASE_REFERENCE_DIR", dir.path());
        let config = EngineConfig::load().expect("config loads");
        assert_eq!(
            config.reference,
            ReferenceSource::Directory(dir.path().to_path_buf())
        );
        reset_env();
    }
}
