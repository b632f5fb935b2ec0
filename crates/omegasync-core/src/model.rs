//! Desired-state data model.
//!
//! A [`ResourceConfig`] is built once per run by the config loader and is
//! read-only afterwards. Remote state uses the same member types but is
//! fetched live and never stored.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ident::Ident;
use crate::languages::expand_languages;

/// Top-level resource kinds managed on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Problem,
    Contest,
}

impl ResourceKind {
    /// Name used in API paths (`/api/<kind>/...`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Problem => "problem",
            Self::Contest => "contest",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set-valued or keyed relations owned by a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Admins,
    AdminGroups,
    Contestants,
    ContestantGroups,
    Tags,
    Problems,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admins => "admins",
            Self::AdminGroups => "admin groups",
            Self::Contestants => "contestants",
            Self::ContestantGroups => "contestant groups",
            Self::Tags => "tags",
            Self::Problems => "problems",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A problem tag. Keyed by name; visibility is only sent on add.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: Ident,
    #[serde(default)]
    pub public: bool,
}

impl Tag {
    pub fn new(name: impl Into<Ident>, public: bool) -> Self {
        Self {
            name: name.into(),
            public,
        }
    }
}

/// A problem's membership in a contest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestProblem {
    pub alias: Ident,
    pub points: f64,
    pub order: u32,
}

impl ContestProblem {
    pub fn new(alias: impl Into<Ident>, points: f64, order: u32) -> Self {
        Self {
            alias: alias.into(),
            points,
            order,
        }
    }

    /// Points and order are the mutable attributes of the association.
    pub fn same_attributes(&self, other: &Self) -> bool {
        self.points == other.points && self.order == other.order
    }
}

/// A single element of a relation, as exchanged with the platform.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    /// Usernames and group aliases.
    Name(Ident),
    Tag(Tag),
    Problem(ContestProblem),
}

impl Member {
    /// The identifier this member is keyed by.
    pub fn id(&self) -> &Ident {
        match self {
            Self::Name(name) => name,
            Self::Tag(tag) => &tag.name,
            Self::Problem(problem) => &problem.alias,
        }
    }

    /// Attribute comparison for keyed members. Bare names and tags have none.
    pub fn same_attributes(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Problem(a), Self::Problem(b)) => a.same_attributes(b),
            _ => true,
        }
    }
}

impl From<Ident> for Member {
    fn from(value: Ident) -> Self {
        Self::Name(value)
    }
}

impl From<Tag> for Member {
    fn from(value: Tag) -> Self {
        Self::Tag(value)
    }
}

impl From<ContestProblem> for Member {
    fn from(value: ContestProblem) -> Self {
        Self::Problem(value)
    }
}

/// Declared relations of a resource. `None` leaves a relation untouched:
/// it is neither listed nor mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subresources {
    pub admins: Option<Vec<Ident>>,
    pub admin_groups: Option<Vec<Ident>>,
    pub contestants: Option<Vec<Ident>>,
    pub contestant_groups: Option<Vec<Ident>>,
    pub tags: Option<Vec<Tag>>,
    pub problems: Option<Vec<ContestProblem>>,
}

impl Subresources {
    /// Desired members per relation, in reconciliation order. Unmanaged
    /// relations are omitted.
    pub fn managed(&self) -> Vec<(Relation, Vec<Member>)> {
        fn names(list: &[Ident]) -> Vec<Member> {
            list.iter().cloned().map(Member::Name).collect()
        }

        let mut out = Vec::new();
        if let Some(admins) = &self.admins {
            out.push((Relation::Admins, names(admins)));
        }
        if let Some(groups) = &self.admin_groups {
            out.push((Relation::AdminGroups, names(groups)));
        }
        if let Some(problems) = &self.problems {
            out.push((
                Relation::Problems,
                problems.iter().cloned().map(Member::Problem).collect(),
            ));
        }
        if let Some(contestants) = &self.contestants {
            out.push((Relation::Contestants, names(contestants)));
        }
        if let Some(groups) = &self.contestant_groups {
            out.push((Relation::ContestantGroups, names(groups)));
        }
        if let Some(tags) = &self.tags {
            out.push((Relation::Tags, tags.iter().cloned().map(Member::Tag).collect()));
        }
        out
    }
}

/// A file uploaded alongside the scalar payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    /// Multipart field name.
    pub field: String,
    pub path: PathBuf,
}

/// Full desired configuration of one resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceConfig {
    pub kind: ResourceKind,
    pub alias: Ident,
    pub title: String,
    /// Symbolic or explicit language list, expanded when the payload is built.
    pub languages: String,
    /// Every other scalar field, already rendered as wire values.
    pub scalars: BTreeMap<String, String>,
    pub contents: Option<Attachment>,
    pub subresources: Subresources,
}

impl ResourceConfig {
    pub fn new(kind: ResourceKind, alias: impl Into<Ident>, title: impl Into<String>) -> Self {
        Self {
            kind,
            alias: alias.into(),
            title: title.into(),
            languages: String::new(),
            scalars: BTreeMap::new(),
            contents: None,
            subresources: Subresources::default(),
        }
    }

    /// Builds the full-replace payload sent on both create and update.
    pub fn payload(&self) -> Payload {
        let mut fields = self.scalars.clone();
        fields.insert("title".to_string(), self.title.clone());
        fields.insert("languages".to_string(), expand_languages(&self.languages));
        Payload {
            alias: self.alias.clone(),
            fields,
            contents: self.contents.clone(),
        }
    }
}

/// Scalar payload for create/update calls.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub alias: Ident,
    pub fields: BTreeMap<String, String>,
    pub contents: Option<Attachment>,
}

/// Result of an existence probe.
#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    Absent,
    Present(serde_json::Value),
}

impl Presence {
    pub fn exists(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_expands_languages_and_sets_title() {
        let mut config = ResourceConfig::new(ResourceKind::Problem, "sumas", "Sumas");
        config.languages = "karel".to_string();
        config
            .scalars
            .insert("visibility".to_string(), "public".to_string());

        let payload = config.payload();
        assert_eq!(payload.alias, Ident::new("sumas"));
        assert_eq!(payload.fields["languages"], "kj,kp");
        assert_eq!(payload.fields["title"], "Sumas");
        assert_eq!(payload.fields["visibility"], "public");
    }

    #[test]
    fn test_managed_skips_unconfigured_relations() {
        let subresources = Subresources {
            admins: Some(vec![Ident::new("bob")]),
            tags: Some(vec![Tag::new("problemTagArrays", true)]),
            ..Default::default()
        };
        let relations: Vec<Relation> = subresources.managed().into_iter().map(|(r, _)| r).collect();
        assert_eq!(relations, vec![Relation::Admins, Relation::Tags]);
    }

    #[test]
    fn test_nothing_declared_manages_nothing() {
        assert!(Subresources::default().managed().is_empty());

        let cleared = Subresources {
            admin_groups: Some(Vec::new()),
            ..Default::default()
        };
        assert_eq!(cleared.managed(), vec![(Relation::AdminGroups, Vec::new())]);
    }

    #[test]
    fn test_contest_problem_attributes() {
        let a = ContestProblem::new("a", 100.0, 1);
        assert!(a.same_attributes(&ContestProblem::new("A", 100.0, 1)));
        assert!(!a.same_attributes(&ContestProblem::new("a", 50.0, 1)));
        assert!(!a.same_attributes(&ContestProblem::new("a", 100.0, 2)));
    }
}
