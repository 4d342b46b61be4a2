//! Runtime settings

use crate::domain::ProjectLayout;
use crate::error::ConfigError;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings files picked up from the working directory when `--config` is absent.
const DISCOVERED_SETTINGS: [&str; 2] = ["test-ranker.toml", ".test-ranker.toml"];

/// Environment variable holding the CircleCI API token.
pub const CI_TOKEN_ENV: &str = "CIRCLE_API_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Git work tree root. Discovered from the working directory when unset.
    pub repo_root: Option<PathBuf>,
    /// Project directory holding the test and source trees, relative to `repo_root`.
    pub project_dir: PathBuf,
    pub test_dir: PathBuf,
    pub source_dir: PathBuf,
    pub test_suffix: String,
    pub source_extension: String,
    pub exclusion_file: PathBuf,
    pub output_dir: PathBuf,
    pub ci: CiSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repo_root: None,
            project_dir: PathBuf::from("packages/contracts-bedrock"),
            test_dir: PathBuf::from("test"),
            source_dir: PathBuf::from("src"),
            test_suffix: ".t.sol".to_string(),
            source_extension: ".sol".to_string(),
            exclusion_file: PathBuf::from("exclusion.toml"),
            output_dir: PathBuf::from("output"),
            ci: CiSettings::default(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CiSettings {
    pub enabled: bool,
    pub api_base: String,
    pub project_slug: String,
    pub branch: String,
    pub job_name: String,
    pub artifact_suffix: String,
    pub lookback_days: u64,
    pub timeout_secs: u64,
    #[serde(skip)]
    pub token: Option<String>,
}

impl Default for CiSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: "https://circleci.com/api/v2".to_string(),
            project_slug: "gh/ethereum-optimism/optimism".to_string(),
            branch: "develop".to_string(),
            job_name: "ai-contracts-test".to_string(),
            artifact_suffix: "log.json".to_string(),
            lookback_days: 14,
            timeout_secs: 10,
            token: None,
        }
    }
}

impl fmt::Debug for CiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CiSettings")
            .field("enabled", &self.enabled)
            .field("api_base", &self.api_base)
            .field("project_slug", &self.project_slug)
            .field("branch", &self.branch)
            .field("job_name", &self.job_name)
            .field("lookback_days", &self.lookback_days)
            .field("timeout_secs", &self.timeout_secs)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl CiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn lookback_secs(&self) -> i64 {
        i64::try_from(self.lookback_days.saturating_mul(24 * 3600)).unwrap_or(i64::MAX)
    }
}

impl Settings {
    /// Load settings once at process start.
    ///
    /// An explicitly provided settings file must exist; auto-discovered ones are
    /// optional. `TEST_RANKER_*` variables override file values (nested keys use
    /// `__`, e.g. `TEST_RANKER_CI__BRANCH`).
    pub fn load(cwd: &Path, config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Settings::default()));

        match config_path {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::Read {
                        path: path.to_path_buf(),
                        source: std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            "settings file not found",
                        ),
                    });
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(found) = discover_settings(cwd) {
                    tracing::debug!("Using settings file {}", found.display());
                    figment = figment.merge(Toml::file(found));
                }
            }
        }

        let token = std::env::var(CI_TOKEN_ENV).ok();
        Self::from_figment(figment.merge(Env::prefixed("TEST_RANKER_").split("__")), token)
    }

    pub fn from_figment(figment: Figment, token: Option<String>) -> Result<Self, ConfigError> {
        let mut settings: Settings =
            figment.extract().map_err(|e| ConfigError::Settings(Box::new(e)))?;
        settings.ci.token = token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        Ok(settings)
    }

    /// Resolve the on-disk layout, anchoring relative paths at `cwd`.
    pub fn layout(&self, cwd: &Path) -> ProjectLayout {
        let repo_root = match &self.repo_root {
            Some(root) => absolutize(cwd, root),
            None => crate::history::discover_repo_root(cwd).unwrap_or_else(|| {
                tracing::warn!(
                    "No git repository found above {}; history lookups will be empty",
                    cwd.display()
                );
                cwd.to_path_buf()
            }),
        };
        let project_root = repo_root.join(&self.project_dir);

        ProjectLayout {
            test_root: project_root.join(&self.test_dir),
            source_root: project_root.join(&self.source_dir),
            repo_root,
            project_root,
            test_suffix: self.test_suffix.clone(),
            source_extension: self.source_extension.clone(),
        }
    }

    pub fn exclusion_path(&self, cwd: &Path) -> PathBuf {
        absolutize(cwd, &self.exclusion_file)
    }

    pub fn output_path(&self, cwd: &Path) -> PathBuf {
        absolutize(cwd, &self.output_dir)
    }
}

fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

fn discover_settings(cwd: &Path) -> Option<PathBuf> {
    DISCOVERED_SETTINGS.iter().map(|name| cwd.join(name)).find(|path| path.is_file())
}
