// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data types shared by the aggregation engine and its collaborators.

use crate::error::ReportError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::{collections::HashSet, fmt, str::FromStr};
use uuid::Uuid;

/// Name of the catch-all category. Never accepted as a preset tag.
pub const OTHER_TAG: &str = "other";

/// Largest number of trailing weeks a single report may cover.
pub const MAX_WEEKS: u32 = 12;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_id!(UserId);
uuid_id!(PostId);

/// A stored post as seen by the report engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: PostId,
    pub author_id: UserId,
    pub content: String,
    /// Tags as stored, compared by exact (case-sensitive) equality.
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A registered user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Ordered list of distinct tags reported as first-class categories.
///
/// Declaration order breaks ties between categories with equal counts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresetTags(Vec<String>);

impl PresetTags {
    pub fn new<I, S>(tags: I) -> Result<Self, ReportError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        let mut seen = HashSet::new();
        for tag in &tags {
            if tag.is_empty() {
                return Err(ReportError::invalid("preset tags", "tags must not be empty"));
            }
            if tag == OTHER_TAG {
                return Err(ReportError::invalid(
                    "preset tags",
                    format!("'{}' is reserved for uncategorized posts", OTHER_TAG),
                ));
            }
            if !seen.insert(tag.as_str()) {
                return Err(ReportError::invalid(
                    "preset tags",
                    format!("duplicate tag '{}'", tag),
                ));
            }
        }
        Ok(Self(tags))
    }

    /// Position of `tag` in declaration order, if it is a preset tag.
    pub fn position(&self, tag: &str) -> Option<usize> {
        self.0.iter().position(|t| t == tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Number of trailing weeks to report on, in `1..=MAX_WEEKS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeekCount(u32);

impl WeekCount {
    pub fn new(weeks: u32) -> Result<Self, ReportError> {
        if !(1..=MAX_WEEKS).contains(&weeks) {
            return Err(ReportError::invalid(
                "week count",
                format!("must be between 1 and {}, got {}", MAX_WEEKS, weeks),
            ));
        }
        Ok(Self(weeks))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl FromStr for WeekCount {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let weeks = s
            .parse::<u32>()
            .map_err(|e| ReportError::invalid("week count", e.to_string()))?;
        Self::new(weeks)
    }
}

/// The category a bucket reports on.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Preset(String),
    Other,
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Preset(tag) => tag,
            Category::Other => OTHER_TAG,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Posts of one category within one classification call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryBucket {
    pub tag: Category,
    pub count: usize,
    pub posts: Vec<PostRecord>,
}

impl CategoryBucket {
    pub(crate) fn new(tag: Category, posts: Vec<PostRecord>) -> Self {
        Self {
            tag,
            count: posts.len(),
            posts,
        }
    }
}

/// Category breakdown for one local Monday-Sunday week.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WeeklyReport {
    /// Local wall-clock start, `YYYY-MM-DDTHH:MM:SS` without zone.
    pub week_start: String,
    /// Local wall-clock end, `YYYY-MM-DDTHH:MM:SS` without zone.
    pub week_end: String,
    pub categories: Vec<CategoryBucket>,
}

/// Most recent week first. Weeks without posts are absent.
pub type WeeklyReportSeries = Vec<WeeklyReport>;

/// One user's series in an all-users report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserWeeklyReports {
    pub user: User,
    pub weeks: WeeklyReportSeries,
}
