//! Contest declarations (`contest.yaml`).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use omegasync_core::{ContestProblem, Ident, ResourceConfig, ResourceKind};
use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::{ConfigError, Result};
use crate::scalar::Scalar;

pub const CONTEST_FILE: &str = "contest.yaml";

const DEFAULT_POINTS: f64 = 100.0;

#[derive(Debug, Clone, Deserialize)]
pub struct Penalty {
    pub time: Scalar,
    pub calc_policy: Scalar,
    #[serde(rename = "type")]
    pub kind: Scalar,
    pub points_decay_factor: Scalar,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContestMisc {
    pub admission_mode: Scalar,
    pub feedback: Scalar,
    pub languages: String,
    pub penalty: Penalty,
    pub requests_user_information: Scalar,
    pub score_mode: Scalar,
    pub scoreboard: Scalar,
    pub show_scoreboard_after: Scalar,
    pub submissions_gap: Scalar,
}

/// Users and groups attached to a contest in some role.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Members {
    #[serde(default)]
    pub users: Option<Vec<Ident>>,
    #[serde(default)]
    pub groups: Option<Vec<Ident>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProblemEntry {
    pub alias: Ident,
    #[serde(default)]
    pub points: Option<f64>,
    #[serde(default)]
    pub order_in_contest: Option<u32>,
}

/// Parsed `contest.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContestSettings {
    pub title: String,
    pub alias: String,
    #[serde(default)]
    pub description: String,
    pub start_time: String,
    pub finish_time: String,
    #[serde(default)]
    pub window_length: Option<Scalar>,
    pub misc: ContestMisc,
    #[serde(default)]
    pub admins: Option<Members>,
    #[serde(default)]
    pub contestants: Option<Members>,
    #[serde(default)]
    pub problems: Option<Vec<ProblemEntry>>,
}

impl ContestSettings {
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONTEST_FILE);
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::io(&path, e))?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml { path, source })
    }

    /// Converts the settings into the desired state of the contest.
    ///
    /// Timestamps are validated here, so a malformed date never reaches the
    /// platform.
    pub fn to_resource(&self, path: &Path) -> Result<ResourceConfig> {
        if self.alias.trim().is_empty() {
            return Err(ConfigError::invalid(path, "alias is empty"));
        }
        let misc = &self.misc;
        let start_time = unix_timestamp(&self.start_time)
            .ok_or_else(|| ConfigError::invalid(path, format!("bad start_time {:?}", self.start_time)))?;
        let finish_time = unix_timestamp(&self.finish_time)
            .ok_or_else(|| ConfigError::invalid(path, format!("bad finish_time {:?}", self.finish_time)))?;
        if finish_time <= start_time {
            return Err(ConfigError::invalid(path, "finish_time must be after start_time"));
        }

        let mut scalars = BTreeMap::new();
        let mut put = |key: &str, value: String| {
            scalars.insert(key.to_string(), value);
        };
        put("admission_mode", misc.admission_mode.to_string());
        put("description", self.description.clone());
        put("feedback", misc.feedback.to_string());
        put("start_time", start_time.to_string());
        put("finish_time", finish_time.to_string());
        put("penalty", misc.penalty.time.to_string());
        put("penalty_calc_policy", misc.penalty.calc_policy.to_string());
        put("penalty_type", misc.penalty.kind.to_string());
        put("points_decay_factor", misc.penalty.points_decay_factor.to_string());
        put("requests_user_information", misc.requests_user_information.to_string());
        put("score_mode", misc.score_mode.to_string());
        put("scoreboard", misc.scoreboard.to_string());
        put("show_scoreboard_after", misc.show_scoreboard_after.to_string());
        put("submissions_gap", misc.submissions_gap.to_string());
        if let Some(window_length) = &self.window_length {
            put("window_length", window_length.to_string());
        }

        let mut config = ResourceConfig::new(ResourceKind::Contest, self.alias.as_str(), &self.title);
        config.languages = misc.languages.clone();
        config.scalars = scalars;

        let subresources = &mut config.subresources;
        if let Some(admins) = &self.admins {
            // An empty user list leaves contest admins alone.
            subresources.admins = admins.users.clone().filter(|users| !users.is_empty());
            subresources.admin_groups = admins.groups.clone();
        }
        if let Some(contestants) = &self.contestants {
            subresources.contestants = contestants.users.clone();
            subresources.contestant_groups = contestants.groups.clone();
        }
        subresources.problems = self.problems.as_ref().map(|problems| {
            problems
                .iter()
                .enumerate()
                .map(|(index, entry)| {
                    ContestProblem::new(
                        entry.alias.clone(),
                        entry.points.unwrap_or(DEFAULT_POINTS),
                        entry.order_in_contest.unwrap_or(index as u32 + 1),
                    )
                })
                .collect()
        });

        Ok(config)
    }
}

fn unix_timestamp(value: &str) -> Option<i64> {
    OffsetDateTime::parse(value, &Rfc3339)
        .ok()
        .map(OffsetDateTime::unix_timestamp)
}

/// Loads and validates a contest directory.
pub fn load_contest(dir: &Path) -> Result<ResourceConfig> {
    let settings = ContestSettings::load(dir)?;
    let config = settings.to_resource(&dir.join(CONTEST_FILE))?;
    tracing::debug!(alias = %config.alias, dir = %dir.display(), "Loaded contest");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use omegasync_core::Relation;

    const CONTEST: &str = r#"
title: OMI 2024
alias: omi-2024
start_time: "2024-03-01T16:00:00Z"
finish_time: "2024-03-01T21:00:00Z"
misc:
  admission_mode: private
  feedback: detailed
  languages: all
  penalty:
    time: 0
    calc_policy: sum
    type: none
    points_decay_factor: 0.0
  requests_user_information: "no"
  score_mode: partial
  scoreboard: 100
  show_scoreboard_after: true
  submissions_gap: 60
admins:
  users: [Carol]
  groups: [omi-staff]
contestants:
  users: [alice, bob]
problems:
  - alias: sumas
  - alias: restas
    points: 50
  - alias: karel
    order_in_contest: 7
"#;

    fn settings() -> ContestSettings {
        serde_yaml::from_str(CONTEST).unwrap()
    }

    #[test]
    fn test_payload_fields() {
        let config = settings().to_resource(Path::new(CONTEST_FILE)).unwrap();
        let payload = config.payload();

        assert_eq!(payload.alias.as_str(), "omi-2024");
        assert_eq!(payload.fields["start_time"], "1709308800");
        assert_eq!(payload.fields["finish_time"], "1709326800");
        assert_eq!(payload.fields["penalty_type"], "none");
        assert_eq!(payload.fields["requests_user_information"], "no");
        assert_eq!(payload.fields["show_scoreboard_after"], "true");
        assert_eq!(payload.fields["description"], "");
        assert!(!payload.fields.contains_key("window_length"));
        assert_eq!(
            payload.fields["languages"],
            omegasync_core::ALL_LANGUAGES.join(",")
        );
    }

    #[test]
    fn test_problem_defaults() {
        let config = settings().to_resource(Path::new(CONTEST_FILE)).unwrap();
        assert_eq!(
            config.subresources.problems,
            Some(vec![
                ContestProblem::new("sumas", 100.0, 1),
                ContestProblem::new("restas", 50.0, 2),
                ContestProblem::new("karel", 100.0, 7),
            ])
        );
    }

    #[test]
    fn test_member_sections() {
        let config = settings().to_resource(Path::new(CONTEST_FILE)).unwrap();
        let subresources = &config.subresources;
        assert_eq!(subresources.admins, Some(vec![Ident::new("carol")]));
        assert_eq!(subresources.admin_groups, Some(vec![Ident::new("omi-staff")]));
        assert_eq!(
            subresources.contestants,
            Some(vec![Ident::new("alice"), Ident::new("bob")])
        );
        assert_eq!(subresources.contestant_groups, None);
    }

    #[test]
    fn test_missing_admins_section_is_unmanaged() {
        let mut settings = settings();
        settings.admins = None;
        let config = settings.to_resource(Path::new(CONTEST_FILE)).unwrap();

        assert_eq!(config.subresources.admins, None);
        assert_eq!(config.subresources.admin_groups, None);
        let relations: Vec<Relation> = config
            .subresources
            .managed()
            .into_iter()
            .map(|(relation, _)| relation)
            .collect();
        assert_eq!(relations, vec![Relation::Problems, Relation::Contestants]);
    }

    #[test]
    fn test_empty_admin_users_are_unmanaged_but_groups_are_kept() {
        let yaml = CONTEST.replace("users: [Carol]", "users: []");
        let settings: ContestSettings = serde_yaml::from_str(&yaml).unwrap();
        let config = settings.to_resource(Path::new(CONTEST_FILE)).unwrap();

        assert_eq!(config.subresources.admins, None);
        assert_eq!(config.subresources.admin_groups, Some(vec![Ident::new("omi-staff")]));
    }

    #[test]
    fn test_bad_timestamp_is_rejected_at_load() {
        let mut settings = settings();
        settings.start_time = "March 1st".to_string();
        let err = settings.to_resource(Path::new(CONTEST_FILE)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_finish_before_start_is_rejected() {
        let mut settings = settings();
        settings.finish_time = "2024-03-01T15:00:00Z".to_string();
        assert!(settings.to_resource(Path::new(CONTEST_FILE)).is_err());
    }
}
