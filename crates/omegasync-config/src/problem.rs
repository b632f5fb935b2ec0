//! Problem declarations (`settings.json`).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use omegasync_core::{Attachment, Ident, ResourceConfig, ResourceKind, Tag};
use serde::Deserialize;

use crate::archive;
use crate::error::{ConfigError, Result};
use crate::scalar::Scalar;

pub const SETTINGS_FILE: &str = "settings.json";

const DEFAULT_GROUP_SCORE_POLICY: &str = "sum-if-not-zero";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Limits {
    pub time_limit: Scalar,
    /// Bytes. Sent to the platform in KiB.
    pub memory_limit: u64,
    pub input_limit: Scalar,
    pub output_limit: Scalar,
    pub extra_wall_time: Scalar,
    pub overall_wall_time_limit: Scalar,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorLimits {
    #[serde(rename = "TimeLimit")]
    pub time_limit: Scalar,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Validator {
    pub name: String,
    #[serde(default)]
    pub limits: Option<ValidatorLimits>,
}

impl Validator {
    pub fn is_custom(&self) -> bool {
        self.name == "custom"
    }
}

/// A tag given either as a bare name or with explicit visibility.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagSpec {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        public: bool,
    },
}

impl From<TagSpec> for Tag {
    fn from(spec: TagSpec) -> Self {
        match spec {
            TagSpec::Name(name) => Tag::new(name, false),
            TagSpec::Full { name, public } => Tag::new(name, public),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Misc {
    pub alias: String,
    pub visibility: Scalar,
    pub languages: String,
    pub email_clarifications: Scalar,
    #[serde(default)]
    pub group_score_policy: Option<String>,
    #[serde(default)]
    pub admins: Option<Vec<Ident>>,
    #[serde(default, rename = "admin-groups")]
    pub admin_groups: Option<Vec<Ident>>,
    #[serde(default)]
    pub tags: Option<Vec<TagSpec>>,
}

/// Parsed `settings.json` of one problem.
#[derive(Debug, Clone, Deserialize)]
pub struct ProblemSettings {
    pub title: String,
    pub source: String,
    pub limits: Limits,
    pub validator: Validator,
    pub misc: Misc,
}

impl ProblemSettings {
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(SETTINGS_FILE);
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::io(&path, e))?;
        let settings: Self = serde_json::from_str(&content)
            .map_err(|source| ConfigError::Json { path: path.clone(), source })?;
        settings.validate(&path)?;
        Ok(settings)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.misc.alias.trim().is_empty() {
            return Err(ConfigError::invalid(path, "misc.alias is empty"));
        }
        if self.title.trim().is_empty() {
            return Err(ConfigError::invalid(path, "title is empty"));
        }
        Ok(())
    }

    /// Converts the settings into the desired state of the problem.
    ///
    /// `message` is the commit message recorded with the new version.
    pub fn to_resource(&self, message: &str) -> ResourceConfig {
        let limits = &self.limits;
        let misc = &self.misc;

        let mut scalars = BTreeMap::new();
        let mut put = |key: &str, value: String| {
            scalars.insert(key.to_string(), value);
        };
        put("message", message.to_string());
        put("source", self.source.clone());
        put("visibility", misc.visibility.to_string());
        put("time_limit", limits.time_limit.to_string());
        put("memory_limit", (limits.memory_limit / 1024).to_string());
        put("input_limit", limits.input_limit.to_string());
        put("output_limit", limits.output_limit.to_string());
        put("extra_wall_time", limits.extra_wall_time.to_string());
        put("overall_wall_time_limit", limits.overall_wall_time_limit.to_string());
        put("validator", self.validator.name.clone());
        if let Some(validator_limits) = &self.validator.limits {
            put("validator_time_limit", validator_limits.time_limit.to_string());
        }
        put("email_clarifications", misc.email_clarifications.to_string());
        put(
            "group_score_policy",
            misc.group_score_policy
                .clone()
                .unwrap_or_else(|| DEFAULT_GROUP_SCORE_POLICY.to_string()),
        );

        let mut config = ResourceConfig::new(ResourceKind::Problem, misc.alias.as_str(), &self.title);
        config.languages = misc.languages.clone();
        config.scalars = scalars;
        config.subresources.admins = misc.admins.clone();
        config.subresources.admin_groups = misc.admin_groups.clone();
        config.subresources.tags = misc
            .tags
            .clone()
            .map(|tags| tags.into_iter().map(Tag::from).collect());
        config
    }
}

/// An unused archive path in `archive_dir`, so aliases that differ only in
/// case never share a file.
fn archive_path(archive_dir: &Path, alias: &Ident) -> PathBuf {
    let mut path = archive_dir.join(format!("{}.zip", alias.folded()));
    let mut suffix = 1;
    while path.exists() {
        path = archive_dir.join(format!("{}-{suffix}.zip", alias.folded()));
        suffix += 1;
    }
    path
}

/// Loads a problem directory and packages its archive into `archive_dir`.
pub fn load_problem(dir: &Path, message: &str, archive_dir: &Path) -> Result<ResourceConfig> {
    let settings = ProblemSettings::load(dir)?;
    let mut config = settings.to_resource(message);

    let archive_path = archive_path(archive_dir, &config.alias);
    archive::package_problem(dir, &settings.validator, &archive_path)?;
    config.contents = Some(Attachment {
        field: "problem_contents".to_string(),
        path: archive_path,
    });

    tracing::debug!(alias = %config.alias, dir = %dir.display(), "Loaded problem");
    Ok(config)
}
