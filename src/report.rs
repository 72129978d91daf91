// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Weekly report assembly over a post source.

use crate::{
    categorize::{categorize, sort_by_count},
    model::{
        CategoryBucket, PostRecord, PresetTags, User, UserId, UserWeeklyReports, WeekCount,
        WeeklyReport, WeeklyReportSeries,
    },
    window::{UtcOffset, compute_week, trailing_days},
};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Length of the rolling summary window.
pub const SUMMARY_DAYS: i64 = 7;

/// Supplies a user's posts for a time range.
pub trait PostSource {
    type Error;

    /// All posts by `user_id` with `start <= created_at <= end`, in any order.
    ///
    /// Implementations must not truncate the result.
    fn fetch_posts_for_user_in_range(
        &self,
        user_id: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PostRecord>, Self::Error>;
}

/// Build one report per non-empty week, current week first.
///
/// Week `k` is the local Monday-Sunday week `k` weeks before the one
/// containing `now`. Weeks without posts are skipped, so the series may be
/// shorter than `week_count`. Errors from `source` are returned unchanged.
pub fn build_series<S: PostSource>(
    source: &S,
    user_id: UserId,
    now: DateTime<Utc>,
    utc_offset: Option<UtcOffset>,
    week_count: WeekCount,
    preset_tags: &PresetTags,
) -> Result<WeeklyReportSeries, S::Error> {
    let mut series = Vec::new();

    for week_offset in 0..week_count.get() {
        let window = compute_week(now, utc_offset, week_offset);
        let mut posts =
            source.fetch_posts_for_user_in_range(user_id, window.start_utc, window.end_utc)?;
        posts.retain(|post| window.contains(post.created_at));

        debug!(
            %user_id,
            week_offset,
            week_start = %window.local_start,
            posts = posts.len(),
            "fetched week"
        );

        if posts.is_empty() {
            continue;
        }

        let mut categories = categorize(&posts, preset_tags);
        if categories.is_empty() {
            continue;
        }
        sort_by_count(&mut categories);

        series.push(WeeklyReport {
            week_start: window.week_start_label(),
            week_end: window.week_end_label(),
            categories,
        });
    }

    Ok(series)
}

/// Build a series for each of `users`, in the given order.
///
/// Users whose series is empty are left out. The first source error stops
/// the run and is returned unchanged.
pub fn build_series_for_users<S: PostSource>(
    source: &S,
    users: &[User],
    now: DateTime<Utc>,
    utc_offset: Option<UtcOffset>,
    week_count: WeekCount,
    preset_tags: &PresetTags,
) -> Result<Vec<UserWeeklyReports>, S::Error> {
    let mut reports = Vec::new();
    for user in users {
        let weeks = build_series(source, user.id, now, utc_offset, week_count, preset_tags)?;
        if weeks.is_empty() {
            debug!(user_id = %user.id, "no activity, skipping user");
            continue;
        }
        reports.push(UserWeeklyReports {
            user: user.clone(),
            weeks,
        });
    }
    Ok(reports)
}

/// Categories for the user's posts over the last [`SUMMARY_DAYS`] days.
pub fn build_rolling_summary<S: PostSource>(
    source: &S,
    user_id: UserId,
    now: DateTime<Utc>,
    preset_tags: &PresetTags,
) -> Result<Vec<CategoryBucket>, S::Error> {
    let (start, end) = trailing_days(now, SUMMARY_DAYS);
    let posts = source.fetch_posts_for_user_in_range(user_id, start, end)?;
    debug!(%user_id, posts = posts.len(), "fetched rolling summary");

    let mut categories = categorize(&posts, preset_tags);
    sort_by_count(&mut categories);
    Ok(categories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PostId;
    use chrono::TimeZone;
    use std::cell::RefCell;

    /// In-memory source that records the ranges it was asked for.
    #[derive(Default)]
    struct MemorySource {
        posts: Vec<PostRecord>,
        requests: RefCell<Vec<(DateTime<Utc>, DateTime<Utc>)>>,
    }

    impl PostSource for MemorySource {
        type Error = std::convert::Infallible;

        fn fetch_posts_for_user_in_range(
            &self,
            user_id: UserId,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<Vec<PostRecord>, Self::Error> {
            self.requests.borrow_mut().push((start, end));
            Ok(self
                .posts
                .iter()
                .filter(|p| p.author_id == user_id && start <= p.created_at && p.created_at <= end)
                .cloned()
                .collect())
        }
    }

    struct FailingSource;

    #[derive(Debug, PartialEq)]
    struct Unavailable;

    impl PostSource for FailingSource {
        type Error = Unavailable;

        fn fetch_posts_for_user_in_range(
            &self,
            _user_id: UserId,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Vec<PostRecord>, Self::Error> {
            Err(Unavailable)
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn post(author_id: UserId, created_at: DateTime<Utc>, tags: &[&str]) -> PostRecord {
        PostRecord {
            id: PostId::new(),
            author_id,
            content: "hello".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at,
        }
    }

    fn presets() -> PresetTags {
        PresetTags::new(["#running", "#reading"]).unwrap()
    }

    #[test]
    fn test_series_skips_empty_weeks() {
        let user = UserId::new();
        // Wednesday 2024-06-12; weeks start 06-10, 06-03, 05-27, 05-20.
        let now = at(2024, 6, 12, 12);
        let source = MemorySource {
            posts: vec![
                post(user, at(2024, 6, 11, 8), &["#running"]),
                post(user, at(2024, 5, 28, 8), &[]),
                post(user, at(2024, 5, 29, 8), &["#reading"]),
                post(UserId::new(), at(2024, 6, 4, 8), &["#running"]),
            ],
            ..Default::default()
        };

        let series =
            build_series(&source, user, now, None, WeekCount::new(4).unwrap(), &presets()).unwrap();

        let starts: Vec<_> = series.iter().map(|r| r.week_start.as_str()).collect();
        assert_eq!(starts, ["2024-06-10T00:00:00", "2024-05-27T00:00:00"]);
        assert_eq!(series[1].week_end, "2024-06-02T23:59:59");
        assert!(series.iter().all(|r| !r.categories.is_empty()));
        assert_eq!(source.requests.borrow().len(), 4);
    }

    #[test]
    fn test_series_uses_utc_window_for_offset() {
        let user = UserId::new();
        let offset = UtcOffset::from_minutes(-480).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 12, 3, 0, 0).unwrap();
        let source = MemorySource {
            posts: vec![
                // Sunday 23:30 local time, inside the week.
                post(user, Utc.with_ymd_and_hms(2024, 6, 17, 7, 30, 0).unwrap(), &["#running"]),
                // Sunday 23:30 UTC, but Sunday 15:30 local the week before.
                post(user, Utc.with_ymd_and_hms(2024, 6, 9, 23, 30, 0).unwrap(), &["#reading"]),
            ],
            ..Default::default()
        };

        let series = build_series(
            &source,
            user,
            now,
            Some(offset),
            WeekCount::new(1).unwrap(),
            &presets(),
        )
        .unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].week_start, "2024-06-10T00:00:00");
        assert_eq!(series[0].week_end, "2024-06-16T23:59:59");
        assert_eq!(series[0].categories.len(), 1);
        assert_eq!(series[0].categories[0].tag.as_str(), "#running");
        assert_eq!(
            source.requests.borrow()[0],
            (
                Utc.with_ymd_and_hms(2024, 6, 10, 8, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 6, 17, 7, 59, 59).unwrap()
            )
        );
    }

    #[test]
    fn test_series_sorts_categories_by_count() {
        let user = UserId::new();
        let now = at(2024, 6, 12, 12);
        let mut posts = vec![post(user, at(2024, 6, 10, 9), &["#running"])];
        posts.extend((0..3).map(|_| post(user, at(2024, 6, 11, 9), &["#reading"])));
        posts.extend((0..2).map(|_| post(user, at(2024, 6, 12, 9), &["#cooking"])));
        let source = MemorySource {
            posts,
            ..Default::default()
        };

        let series =
            build_series(&source, user, now, None, WeekCount::new(1).unwrap(), &presets()).unwrap();

        let order: Vec<_> = series[0]
            .categories
            .iter()
            .map(|c| (c.tag.as_str(), c.count))
            .collect();
        assert_eq!(order, [("#reading", 3), ("other", 2), ("#running", 1)]);
    }

    #[test]
    fn test_series_is_idempotent() {
        let user = UserId::new();
        let now = at(2024, 6, 12, 12);
        let source = MemorySource {
            posts: vec![
                post(user, at(2024, 6, 11, 8), &["#running", "#reading"]),
                post(user, at(2024, 6, 4, 8), &["#x"]),
            ],
            ..Default::default()
        };
        let weeks = WeekCount::new(3).unwrap();

        let first = build_series(&source, user, now, None, weeks, &presets()).unwrap();
        let second = build_series(&source, user, now, None, weeks, &presets()).unwrap();
        assert_eq!(first, second);
    }

    /// Ignores the requested range entirely.
    struct LooseSource(Vec<PostRecord>);

    impl PostSource for LooseSource {
        type Error = std::convert::Infallible;

        fn fetch_posts_for_user_in_range(
            &self,
            _user_id: UserId,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Vec<PostRecord>, Self::Error> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_series_drops_posts_outside_the_week() {
        let user = UserId::new();
        let source = LooseSource(vec![
            post(user, at(2024, 6, 11, 8), &["#running"]),
            post(user, at(2024, 6, 9, 23), &["#reading"]),
        ]);

        let series = build_series(
            &source,
            user,
            at(2024, 6, 12, 12),
            None,
            WeekCount::new(1).unwrap(),
            &presets(),
        )
        .unwrap();

        assert_eq!(series.len(), 1);
        let order: Vec<_> = series[0]
            .categories
            .iter()
            .map(|c| (c.tag.as_str(), c.count))
            .collect();
        assert_eq!(order, [("#running", 1)]);
    }

    fn user(email: &str) -> User {
        User {
            id: UserId::new(),
            email: email.to_string(),
            name: email.to_string(),
            created_at: at(2024, 1, 1, 0),
        }
    }

    #[test]
    fn test_series_for_users_skips_quiet_users() {
        let ada = user("ada@example.com");
        let quiet = user("quiet@example.com");
        let bob = user("bob@example.com");
        let source = MemorySource {
            posts: vec![
                post(bob.id, at(2024, 6, 11, 8), &["#reading"]),
                post(ada.id, at(2024, 6, 4, 8), &["#running"]),
            ],
            ..Default::default()
        };

        let reports = build_series_for_users(
            &source,
            &[ada.clone(), quiet, bob.clone()],
            at(2024, 6, 12, 12),
            None,
            WeekCount::new(2).unwrap(),
            &presets(),
        )
        .unwrap();

        let users: Vec<_> = reports.iter().map(|r| r.user.id).collect();
        assert_eq!(users, [ada.id, bob.id]);
        assert_eq!(reports[0].weeks[0].week_start, "2024-06-03T00:00:00");
        assert_eq!(reports[1].weeks[0].week_start, "2024-06-10T00:00:00");
        assert_eq!(source.requests.borrow().len(), 6);
    }

    #[test]
    fn test_source_failure_propagates() {
        let result = build_series(
            &FailingSource,
            UserId::new(),
            at(2024, 6, 12, 12),
            None,
            WeekCount::new(2).unwrap(),
            &presets(),
        );
        assert_eq!(result, Err(Unavailable));
    }

    #[test]
    fn test_rolling_summary_covers_last_seven_days() {
        let user = UserId::new();
        let now = at(2024, 6, 12, 12);
        let source = MemorySource {
            posts: vec![
                post(user, at(2024, 6, 5, 12), &["#running"]),
                post(user, at(2024, 6, 5, 11), &["#running"]),
                post(user, at(2024, 6, 12, 11), &[]),
                post(user, at(2024, 6, 12, 10), &[]),
                post(user, at(2024, 6, 9, 10), &[]),
            ],
            ..Default::default()
        };

        let summary = build_rolling_summary(&source, user, now, &presets()).unwrap();
        let order: Vec<_> = summary.iter().map(|c| (c.tag.as_str(), c.count)).collect();
        assert_eq!(order, [("other", 3), ("#running", 1)]);
    }
}
