// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sample data generation for trying out reports.

use crate::{
    db::{self, NewPost},
    model::{PresetTags, User},
};
use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};
use rusqlite::Connection;
use tracing::info;

const CONTENTS: &[&str] = &[
    "Up before sunrise today.",
    "Morning run was tough but rewarding.",
    "Finished another chapter of my book.",
    "Long run today, feeling accomplished.",
    "Reading corner is my happy place.",
    "Early morning routine is getting easier.",
    "Trying out a new recipe.",
    "Planning for the upcoming week.",
    "Had a great conversation with a friend.",
    "Running in the rain was refreshing.",
];

/// Parameters for [`seed_posts`].
#[derive(Debug)]
pub struct SeedOptions<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub weeks: u32,
    pub rng_seed: u64,
    pub now: DateTime<Utc>,
}

/// Outcome of a seeding run.
#[derive(Debug)]
pub struct SeedSummary {
    pub user: User,
    pub user_created: bool,
    pub posts_created: usize,
}

/// Write generated posts for the last `weeks * 7` days, creating the user if
/// needed.
///
/// Weekdays get 3-8 posts and weekend days 1-4. Three out of four posts are
/// tagged; which preset tag dominates rotates with the day so that weekly
/// reports differ from one week to the next.
pub fn seed_posts(
    conn: &Connection,
    options: &SeedOptions<'_>,
    preset_tags: &PresetTags,
    extra_tags: &[String],
) -> Result<SeedSummary> {
    let (user, user_created) = match db::find_user_by_email(conn, options.email)? {
        Some(user) => (user, false),
        None => (
            db::insert_user(conn, options.email, options.name, options.now)?,
            true,
        ),
    };

    let presets: Vec<&str> = preset_tags.iter().collect();
    let mut rng = StdRng::seed_from_u64(options.rng_seed);
    let mut posts_created = 0;

    for day_offset in 0..i64::from(options.weeks) * 7 {
        let day = options.now - Duration::days(day_offset);
        let weekend = matches!(day.weekday(), Weekday::Sat | Weekday::Sun);
        let count = if weekend {
            rng.random_range(1..=4)
        } else {
            rng.random_range(3..=8)
        };

        for _ in 0..count {
            let created_at = day
                .with_hour(rng.random_range(6..=22))
                .and_then(|d| d.with_minute(rng.random_range(0..60)))
                .and_then(|d| d.with_second(0))
                .context("generated an invalid time of day")?;
            // Posts are only ever generated up to the reference time.
            if created_at > options.now {
                continue;
            }

            let tags = pick_tags(&mut rng, &presets, extra_tags, day_offset);
            let content = CONTENTS.choose(&mut rng).copied().unwrap_or_default();
            db::insert_post(
                conn,
                &NewPost {
                    author_id: user.id,
                    content,
                    tags: &tags,
                    created_at,
                },
            )?;
            posts_created += 1;
        }
    }

    info!(
        user = %user.email,
        posts_created,
        weeks = options.weeks,
        "seeded sample posts"
    );

    Ok(SeedSummary {
        user,
        user_created,
        posts_created,
    })
}

fn pick_tags<R: Rng>(
    rng: &mut R,
    presets: &[&str],
    extra_tags: &[String],
    day_offset: i64,
) -> Vec<String> {
    let mut tags = Vec::new();
    if rng.random_bool(0.25) {
        return tags;
    }

    if !presets.is_empty() {
        // Favor a different preset every couple of days.
        let favored = presets[(day_offset as usize / 2) % presets.len()];
        if rng.random_bool(0.7) {
            tags.push(favored.to_string());
        }
        if rng.random_bool(0.4) {
            if let Some(second) = presets.choose(rng) {
                tags.push(second.to_string());
            }
        }
    }
    if tags.is_empty() || rng.random_bool(0.1) {
        if let Some(extra) = extra_tags.choose(rng) {
            tags.push(extra.clone());
        }
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn options(now: DateTime<Utc>, rng_seed: u64) -> SeedOptions<'static> {
        SeedOptions {
            email: "sample@example.com",
            name: "Sample",
            weeks: 2,
            rng_seed,
            now,
        }
    }

    #[test]
    fn test_seed_creates_user_once_and_stays_in_range() {
        let conn = db::open_in_memory().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 12, 12, 0, 0).unwrap();
        let presets = PresetTags::new(["#running", "#reading"]).unwrap();
        let extra = vec!["#cooking".to_string()];

        let first = seed_posts(&conn, &options(now, 7), &presets, &extra).unwrap();
        assert!(first.user_created);
        assert!(first.posts_created > 0);

        let second = seed_posts(&conn, &options(now, 8), &presets, &extra).unwrap();
        assert!(!second.user_created);
        assert_eq!(first.user.id, second.user.id);

        let start = now - Duration::days(14);
        let posts = db::fetch_posts_for_user_in_range(&conn, first.user.id, start, now).unwrap();
        assert_eq!(posts.len(), first.posts_created + second.posts_created);
        for post in &posts {
            for tag in &post.tags {
                assert!(presets.position(tag).is_some() || extra.contains(tag));
            }
        }
    }

    #[test]
    fn test_seed_is_deterministic() {
        let now = Utc.with_ymd_and_hms(2024, 6, 12, 12, 0, 0).unwrap();
        let presets = PresetTags::new(["#running", "#reading"]).unwrap();
        let extra = vec!["#cooking".to_string()];

        let tag_lists = |seed| {
            let conn = db::open_in_memory().unwrap();
            let summary = seed_posts(&conn, &options(now, seed), &presets, &extra).unwrap();
            let start = now - Duration::days(14);
            let mut lists: Vec<_> =
                db::fetch_posts_for_user_in_range(&conn, summary.user.id, start, now)
                    .unwrap()
                    .into_iter()
                    .map(|p| (p.created_at, p.tags))
                    .collect();
            // Ids are random, so posts sharing a minute come back in any order.
            lists.sort();
            lists
        };

        assert_eq!(tag_lists(42), tag_lists(42));
    }
}
