//! Reporting windows and aggregate result shapes.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::events::EventView;
use crate::limits::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

/// Rolling reporting window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "24h")]
    Day,
    #[default]
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
}

impl Period {
    /// Parses a period token; anything unrecognized is a week.
    pub fn from_token(token: Option<&str>) -> Self {
        match token.map(str::trim) {
            Some("24h") => Self::Day,
            Some("30d") => Self::Month,
            Some("90d") => Self::Quarter,
            _ => Self::Week,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "24h",
            Self::Week => "7d",
            Self::Month => "30d",
            Self::Quarter => "90d",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Self::Day => Duration::hours(24),
            Self::Week => Duration::days(7),
            Self::Month => Duration::days(30),
            Self::Quarter => Duration::days(90),
        }
    }

    /// Inclusive start of the window ending at `now`.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.duration()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a top-N breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedCount {
    #[serde(rename = "_id")]
    pub key: String,
    pub count: u64,
}

/// Ranks grouped counts: count descending, key ascending on ties, first `n`.
pub fn rank_top(counts: HashMap<String, u64>, n: usize) -> Vec<RankedCount> {
    let mut ranked: Vec<RankedCount> = counts
        .into_iter()
        .map(|(key, count)| RankedCount { key, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    ranked.truncate(n);
    ranked
}

/// Headline counts of the summary report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryCounts {
    pub total_views: u64,
    pub unique_visitors: u64,
    pub contact_forms: u64,
    pub resume_downloads: u64,
}

/// Summary report over one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub period: Period,
    pub summary: SummaryCounts,
    pub top_pages: Vec<RankedCount>,
    pub top_projects: Vec<RankedCount>,
}

/// Offset pagination request, normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Parses raw query values: page ≥ 1, limit clamped to 1..=MAX_PAGE_LIMIT.
    pub fn from_params(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<u64>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(1);
        let limit = limit
            .and_then(|l| l.trim().parse::<u64>().ok())
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .min(MAX_PAGE_LIMIT);
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn pagination(&self, total: u64) -> Pagination {
        Pagination {
            current: self.page,
            pages: total.div_ceil(self.limit),
            total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current: u64,
    pub pages: u64,
    pub total: u64,
}

/// One page of the detailed analytics view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedAnalytics {
    pub analytics: Vec<EventView>,
    pub pagination: Pagination,
}

/// All-time counts for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardCounts {
    pub contacts: ContactCounts,
    pub projects: ProjectCounts,
    pub analytics: VisitorCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactCounts {
    pub total: u64,
    pub new: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCounts {
    pub total: u64,
    pub published: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorCounts {
    pub total_views: u64,
    pub unique_visitors: u64,
}
