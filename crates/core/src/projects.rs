//! Portfolio project records, listing semantics and admin input.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::{Error, Result};

/// Publication state of a project. Only `Published` is publicly readable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Draft,
    #[default]
    Published,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            other => Err(Error::invalid_field(
                "status",
                format!("'{}' is not a valid project status", other),
            )),
        }
    }
}

/// Which project link was clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickKind {
    Github,
    Live,
}

impl ClickKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Live => "live",
        }
    }
}

impl fmt::Display for ClickKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClickKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "github" => Ok(Self::Github),
            "live" => Ok(Self::Live),
            _ => Err(Error::invalid_field("type", "Invalid click type")),
        }
    }
}

/// Per-link click counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickCounters {
    pub github: u64,
    pub live: u64,
}

impl ClickCounters {
    pub fn record(&mut self, kind: ClickKind) {
        match kind {
            ClickKind::Github => self.github += 1,
            ClickKind::Live => self.live += 1,
        }
    }
}

/// One portfolio project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub github_url: String,
    pub live_url: String,
    pub image_url: String,
    pub featured: bool,
    pub order: i32,
    pub status: ProjectStatus,
    pub views: u64,
    pub clicks: ClickCounters,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn is_published(&self) -> bool {
        self.status == ProjectStatus::Published
    }

    /// Listing order: featured first, then `order` ascending, then newest.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        other
            .featured
            .cmp(&self.featured)
            .then_with(|| self.order.cmp(&other.order))
            .then_with(|| other.created_at.cmp(&self.created_at))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Public listing parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectQuery {
    pub featured_only: bool,
    pub limit: Option<usize>,
}

impl ProjectQuery {
    /// Parses raw query-string values leniently.
    ///
    /// Only `featured=true` filters; a limit that is not a positive integer
    /// means no limit.
    pub fn from_params(featured: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            featured_only: featured == Some("true"),
            limit: limit
                .and_then(|l| l.trim().parse::<usize>().ok())
                .filter(|l| *l > 0),
        }
    }

    /// Filters, sorts and limits a set of projects.
    ///
    /// Unpublished projects are always dropped.
    pub fn apply(&self, projects: impl IntoIterator<Item = Project>) -> Vec<Project> {
        let mut selected: Vec<Project> = projects
            .into_iter()
            .filter(|p| p.is_published())
            .filter(|p| !self.featured_only || p.featured)
            .collect();
        selected.sort_by(Project::display_cmp);
        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}

fn validate_github_url(url: &str) -> std::result::Result<(), ValidationError> {
    let rest = url.strip_prefix("https://github.com/").unwrap_or("");
    if rest.is_empty() || rest.contains(char::is_whitespace) {
        let mut err = ValidationError::new("github_url");
        err.message = Some("Please enter a valid GitHub URL".into());
        return Err(err);
    }
    Ok(())
}

/// Admin create/update input. Counters are not accepted from clients.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectDraft {
    #[validate(length(min = 3, max = 100, message = "Title must be between 3 and 100 characters"))]
    pub title: String,
    #[validate(length(
        min = 10,
        max = 1000,
        message = "Description must be between 10 and 1000 characters"
    ))]
    pub description: String,
    #[validate(length(min = 1, message = "At least one technology is required"))]
    pub technologies: Vec<String>,
    #[validate(custom(function = "validate_github_url"))]
    pub github_url: String,
    #[validate(url(message = "Please enter a valid live URL"))]
    pub live_url: String,
    #[validate(url(message = "Please enter a valid image URL"))]
    pub image_url: String,
    pub featured: bool,
    pub order: i32,
    pub status: ProjectStatus,
}

impl ProjectDraft {
    /// Trims text fields and drops blank technologies, then validates.
    pub fn normalize(mut self) -> Result<Self> {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
        self.technologies = self
            .technologies
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        self.github_url = self.github_url.trim().to_string();
        self.live_url = self.live_url.trim().to_string();
        self.image_url = self.image_url.trim().to_string();
        self.validate()?;
        Ok(self)
    }

    /// Builds a brand-new project with zeroed counters.
    pub fn into_project(self, id: impl Into<String>, now: DateTime<Utc>) -> Project {
        Project {
            id: id.into(),
            title: self.title,
            description: self.description,
            technologies: self.technologies,
            github_url: self.github_url,
            live_url: self.live_url,
            image_url: self.image_url,
            featured: self.featured,
            order: self.order,
            status: self.status,
            views: 0,
            clicks: ClickCounters::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the editable fields of `existing`, keeping identity and counters.
    pub fn apply_to(self, existing: &Project, now: DateTime<Utc>) -> Project {
        Project {
            id: existing.id.clone(),
            views: existing.views,
            clicks: existing.clicks,
            created_at: existing.created_at,
            ..self.into_project(String::new(), now)
        }
    }
}
