//! Settings for a furnace invocation.
//!
//! Everything is read once from the config directory into a [`Settings`]
//! value that commands receive explicitly.

use crate::paths;
use serde::{Deserialize, Serialize};
use stackkit::{PollConfig, Provider, RetryConfig, Template};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default stack name when none is given on the command line or in the file
pub const DEFAULT_STACK_NAME: &str = "FurnaceStack";

/// Default AWS region
pub const DEFAULT_REGION: &str = "eu-central-1";

/// Errors from loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Could not read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid {} format", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid {} format", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Template not found: {}", path.display())]
    MissingTemplate { path: PathBuf },

    #[error("{field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

// ============================================================================
// furnace.toml
// ============================================================================

/// On-disk shape of `furnace.toml`. Every field is optional.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FurnaceConfig {
    pub provider: Option<Provider>,
    pub stack_name: Option<String>,
    pub template: Option<String>,
    pub aws: AwsSection,
    pub gcp: GcpSection,
    pub poll: PollSection,
    pub retry: RetrySection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AwsSection {
    pub region: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GcpSection {
    pub project: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollSection {
    pub interval_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    /// `0` disables the overall deadline
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySection {
    pub max_attempts: Option<u32>,
    pub base_delay_secs: Option<f64>,
    pub backoff_factor: Option<f64>,
    pub max_delay_secs: Option<f64>,
}

impl FurnaceConfig {
    /// Load `furnace.toml` from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("No settings file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigLoadError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        toml::from_str(&content).map_err(|source| ConfigLoadError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    fn poll_config(&self) -> Result<PollConfig, ConfigLoadError> {
        let defaults = PollConfig::default();
        let retry_defaults = RetryConfig::default();

        let interval = self
            .poll
            .interval_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.interval);
        let max_attempts = self.poll.max_attempts.unwrap_or(defaults.max_attempts);
        if max_attempts == 0 {
            return Err(ConfigLoadError::Invalid {
                field: "poll.max_attempts",
                reason: "must be greater than zero",
            });
        }
        let timeout = match self.poll.timeout_secs {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.timeout,
        };

        let retry_attempts = self.retry.max_attempts.unwrap_or(retry_defaults.max_attempts);
        if retry_attempts == 0 {
            return Err(ConfigLoadError::Invalid {
                field: "retry.max_attempts",
                reason: "must be greater than zero",
            });
        }
        let backoff_factor = self
            .retry
            .backoff_factor
            .unwrap_or(retry_defaults.backoff_factor);
        if !backoff_factor.is_finite() || backoff_factor < 1.0 {
            return Err(ConfigLoadError::Invalid {
                field: "retry.backoff_factor",
                reason: "must be a finite number of at least 1.0",
            });
        }
        let retry = RetryConfig {
            max_attempts: retry_attempts,
            base_delay: seconds(
                "retry.base_delay_secs",
                self.retry.base_delay_secs,
                retry_defaults.base_delay,
            )?,
            backoff_factor,
            max_delay: seconds(
                "retry.max_delay_secs",
                self.retry.max_delay_secs,
                retry_defaults.max_delay,
            )?,
        };

        Ok(PollConfig {
            interval,
            max_attempts,
            timeout,
            retry,
        })
    }
}

fn seconds(
    field: &'static str,
    secs: Option<f64>,
    default: Duration,
) -> Result<Duration, ConfigLoadError> {
    match secs {
        None => Ok(default),
        Some(secs) => Duration::try_from_secs_f64(secs).map_err(|_| ConfigLoadError::Invalid {
            field,
            reason: "must be a non-negative number of seconds within range",
        }),
    }
}

// ============================================================================
// ec2_conf.json
// ============================================================================

/// EC2 instance settings kept alongside the templates. Missing fields take
/// their zero values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ec2Config {
    pub dry_run: bool,
    pub image_id: String,
    pub key_name: String,
    pub min_count: u32,
    pub max_count: u32,
    pub instance_type: String,
    pub monitoring: Monitoring,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Monitoring {
    pub enabled: bool,
}

impl Ec2Config {
    /// Load `ec2_conf.json`, or `None` when the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigLoadError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigLoadError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| ConfigLoadError::Json {
                path: path.to_path_buf(),
                source,
            })
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config_dir: PathBuf,
    pub provider: Provider,
    pub stack_name: String,
    pub template_path: PathBuf,
    pub region: String,
    pub project: Option<String>,
    pub poll: PollConfig,
}

impl Settings {
    /// Read `furnace.toml` under `config_dir`, with `provider` overriding
    /// the file when given.
    pub fn load(config_dir: &Path, provider: Option<Provider>) -> Result<Self, ConfigLoadError> {
        let file = FurnaceConfig::load(&config_dir.join(paths::SETTINGS_FILE))?;
        Self::from_file(config_dir, file, provider)
    }

    fn from_file(
        config_dir: &Path,
        file: FurnaceConfig,
        provider: Option<Provider>,
    ) -> Result<Self, ConfigLoadError> {
        let provider = provider.or(file.provider).unwrap_or_default();
        let poll = file.poll_config()?;

        let template = file
            .template
            .as_deref()
            .unwrap_or(default_template(provider));
        let template_path = paths::resolve_in(config_dir, template);

        Ok(Self {
            config_dir: config_dir.to_path_buf(),
            provider,
            stack_name: stackkit::stack_name(file.stack_name.as_deref(), DEFAULT_STACK_NAME),
            template_path,
            region: file
                .aws
                .region
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            project: file.gcp.project.filter(|p| !p.trim().is_empty()),
            poll,
        })
    }

    /// Path of the EC2 settings file.
    pub fn ec2_path(&self) -> PathBuf {
        self.config_dir.join(paths::EC2_CONFIG_FILE)
    }

    /// Read the template body.
    pub fn load_template(&self) -> Result<Template, ConfigLoadError> {
        match fs::read(&self.template_path) {
            Ok(body) => Ok(Template::new(body)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ConfigLoadError::MissingTemplate {
                    path: self.template_path.clone(),
                })
            }
            Err(source) => Err(ConfigLoadError::Read {
                path: self.template_path.clone(),
                source,
            }),
        }
    }
}

/// Template file name used when `furnace.toml` names none.
pub fn default_template(provider: Provider) -> &'static str {
    match provider {
        Provider::Aws => "cloud_formation.template",
        Provider::Gcp => "deployment.yaml",
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_settings_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(dir.path(), None).unwrap();

        assert_eq!(settings.provider, Provider::Aws);
        assert_eq!(settings.stack_name, "FurnaceStack");
        assert_eq!(settings.region, "eu-central-1");
        assert_eq!(
            settings.template_path,
            dir.path().join("cloud_formation.template")
        );
        assert_eq!(settings.poll.max_attempts, PollConfig::default().max_attempts);
    }

    #[test]
    fn test_full_settings_file() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "furnace.toml",
            r#"
provider = "gcp"
stack_name = "web"
template = "stacks/web.yaml"

[aws]
region = "us-west-2"

[gcp]
project = "ops-sandbox"

[poll]
interval_secs = 5
max_attempts = 12
timeout_secs = 0

[retry]
max_attempts = 2
base_delay_secs = 0.5
backoff_factor = 3.0
max_delay_secs = 4
"#,
        );

        let settings = Settings::load(dir.path(), None).unwrap();
        assert_eq!(settings.provider, Provider::Gcp);
        assert_eq!(settings.stack_name, "web");
        assert_eq!(settings.region, "us-west-2");
        assert_eq!(settings.project.as_deref(), Some("ops-sandbox"));
        assert_eq!(settings.template_path, dir.path().join("stacks/web.yaml"));
        assert_eq!(settings.poll.interval, Duration::from_secs(5));
        assert_eq!(settings.poll.max_attempts, 12);
        assert_eq!(settings.poll.timeout, None);
        assert_eq!(settings.poll.retry.max_attempts, 2);
        assert_eq!(settings.poll.retry.base_delay, Duration::from_millis(500));
        assert_eq!(settings.poll.retry.max_delay, Duration::from_secs(4));
    }

    #[test]
    fn test_flag_overrides_provider_and_default_template() {
        let dir = TempDir::new().unwrap();
        write(&dir, "furnace.toml", "provider = \"aws\"\n");

        let settings = Settings::load(dir.path(), Some(Provider::Gcp)).unwrap();
        assert_eq!(settings.provider, Provider::Gcp);
        assert_eq!(settings.template_path, dir.path().join("deployment.yaml"));
    }

    #[test]
    fn test_blank_stack_name_falls_back() {
        let dir = TempDir::new().unwrap();
        write(&dir, "furnace.toml", "stack_name = \"  \"\n");

        let settings = Settings::load(dir.path(), None).unwrap();
        assert_eq!(settings.stack_name, DEFAULT_STACK_NAME);
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "furnace.toml", "provider = [\n");

        let err = Settings::load(dir.path(), None).unwrap_err();
        assert!(matches!(&err, ConfigLoadError::Toml { path: p, .. } if *p == path));
        assert!(err.to_string().contains("furnace.toml"));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        write(&dir, "furnace.toml", "regoin = \"us-east-1\"\n");

        assert!(matches!(
            Settings::load(dir.path(), None),
            Err(ConfigLoadError::Toml { .. })
        ));
    }

    #[test]
    fn test_zero_poll_attempts_rejected() {
        let dir = TempDir::new().unwrap();
        write(&dir, "furnace.toml", "[poll]\nmax_attempts = 0\n");

        let err = Settings::load(dir.path(), None).unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::Invalid {
                field: "poll.max_attempts",
                ..
            }
        ));
    }

    #[test]
    fn test_load_template() {
        let dir = TempDir::new().unwrap();
        write(&dir, "cloud_formation.template", "{\"Resources\": {}}");

        let settings = Settings::load(dir.path(), None).unwrap();
        let template = settings.load_template().unwrap();
        assert_eq!(template.bytes(), b"{\"Resources\": {}}");
    }

    #[test]
    fn test_missing_template() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(dir.path(), None).unwrap();

        assert!(matches!(
            settings.load_template(),
            Err(ConfigLoadError::MissingTemplate { .. })
        ));
    }

    #[test]
    fn test_ec2_config() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "ec2_conf.json",
            r#"{
  "dry_run": true,
  "image_id": "ami-0bd3b2ad1b7ab4ab0",
  "key_name": "ops",
  "min_count": 1,
  "max_count": 2,
  "instance_type": "t2.micro",
  "monitoring": { "enabled": true }
}"#,
        );

        let ec2 = Ec2Config::load(&path).unwrap().unwrap();
        assert!(ec2.dry_run);
        assert_eq!(ec2.max_count, 2);
        assert_eq!(ec2.instance_type, "t2.micro");
        assert!(ec2.monitoring.enabled);
    }

    #[test]
    fn test_partial_ec2_config_uses_zero_values() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "ec2_conf.json", r#"{"instance_type": "t3.small"}"#);

        let ec2 = Ec2Config::load(&path).unwrap().unwrap();
        assert_eq!(ec2.instance_type, "t3.small");
        assert_eq!(ec2.image_id, "");
        assert_eq!(ec2.max_count, 0);
        assert!(!ec2.monitoring.enabled);
    }

    #[test]
    fn test_huge_delay_rejected() {
        let dir = TempDir::new().unwrap();
        write(&dir, "furnace.toml", "[retry]\nmax_delay_secs = 1e30\n");

        let err = Settings::load(dir.path(), None).unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::Invalid {
                field: "retry.max_delay_secs",
                ..
            }
        ));
    }

    #[test]
    fn test_negative_base_delay_rejected() {
        let dir = TempDir::new().unwrap();
        write(&dir, "furnace.toml", "[retry]\nbase_delay_secs = -1.5\n");

        assert!(matches!(
            Settings::load(dir.path(), None),
            Err(ConfigLoadError::Invalid {
                field: "retry.base_delay_secs",
                ..
            })
        ));
    }

    #[test]
    fn test_shrinking_backoff_rejected() {
        let dir = TempDir::new().unwrap();
        for factor in ["-2.0", "0.5", "inf", "nan"] {
            write(
                &dir,
                "furnace.toml",
                &format!("[retry]\nbackoff_factor = {factor}\n"),
            );
            assert!(
                matches!(
                    Settings::load(dir.path(), None),
                    Err(ConfigLoadError::Invalid {
                        field: "retry.backoff_factor",
                        ..
                    })
                ),
                "backoff_factor = {factor}"
            );
        }
    }

    #[test]
    fn test_ec2_config_optional() {
        let dir = TempDir::new().unwrap();
        assert!(Ec2Config::load(&dir.path().join("ec2_conf.json"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_ec2_config_invalid() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "ec2_conf.json", "{\"image_id\": 3}");

        assert!(matches!(
            Ec2Config::load(&path),
            Err(ConfigLoadError::Json { .. })
        ));
    }
}
