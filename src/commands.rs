// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command implementations.

use crate::{
    config::Config,
    db::{self, NewPost, SqlitePostSource},
    error::ReportError,
    model::{User, UserId, WeekCount},
    render, report,
    seed::{self, SeedOptions},
    window::UtcOffset,
};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

/// Whose activity a weekly report covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReportTarget {
    /// A single user, by id or email address.
    User(String),
    /// Every registered user.
    AllUsers,
}

/// Options for the weekly report command.
#[derive(Debug)]
pub struct ReportOptions {
    pub target: ReportTarget,
    pub weeks: Option<WeekCount>,
    pub utc_offset: Option<UtcOffset>,
    pub now: Option<DateTime<Utc>>,
    pub json: bool,
    pub output: Option<Utf8PathBuf>,
}

/// Resolve a user given either an id or an email address.
pub fn resolve_user(conn: &Connection, selector: &str) -> Result<User> {
    let found = match selector.parse::<UserId>() {
        Ok(user_id) => db::find_user(conn, user_id)?,
        Err(_) => db::find_user_by_email(conn, selector)?,
    };
    found.ok_or_else(|| ReportError::NotFound(selector.to_string()).into())
}

/// Run the add-user command.
pub fn run_add_user(database: &Utf8Path, email: &str, name: &str) -> Result<()> {
    let conn = db::init_db(database).context("failed to open database")?;
    let user = db::insert_user(&conn, email, name, Utc::now())?;
    println!("Created user {} ({})", user.id, user.email);
    Ok(())
}

/// Run the users command.
pub fn run_users(database: &Utf8Path) -> Result<()> {
    let conn = db::init_db(database).context("failed to open database")?;
    let users = db::list_users(&conn)?;
    print!("{}", render::format_users(&users));
    Ok(())
}

/// Run the post command.
pub fn run_post(
    database: &Utf8Path,
    user: &str,
    content: &str,
    tags: &[String],
    at: Option<DateTime<Utc>>,
) -> Result<()> {
    let conn = db::init_db(database).context("failed to open database")?;
    let author = resolve_user(&conn, user)?;
    let post = db::insert_post(
        &conn,
        &NewPost {
            author_id: author.id,
            content,
            tags,
            created_at: at.unwrap_or_else(Utc::now),
        },
    )?;
    println!(
        "Created post {} at {} with tags [{}]",
        post.id,
        db::format_timestamp(post.created_at),
        post.tags.join(", ")
    );
    Ok(())
}

/// Run the tags command.
pub fn run_tags(database: &Utf8Path) -> Result<()> {
    let conn = db::init_db(database).context("failed to open database")?;
    let tags = db::list_tags(&conn)?;
    print!("{}", render::format_tags(&tags));
    Ok(())
}

/// Run the seed command.
pub fn run_seed(
    database: &Utf8Path,
    config: &Config,
    email: &str,
    name: &str,
    weeks: Option<u32>,
    rng_seed: u64,
) -> Result<()> {
    println!("Initializing database at {}", database);
    let conn = db::init_db(database).context("failed to initialize database")?;
    let preset_tags = config.preset_tags()?;

    let summary = seed::seed_posts(
        &conn,
        &SeedOptions {
            email,
            name,
            weeks: weeks.unwrap_or(config.seed.weeks),
            rng_seed,
            now: Utc::now(),
        },
        &preset_tags,
        &config.seed.extra_tags,
    )?;

    if summary.user_created {
        println!("Created user {} ({})", summary.user.name, summary.user.email);
    } else {
        println!(
            "Using existing user {} ({})",
            summary.user.name, summary.user.email
        );
    }
    println!(
        "Created {} sample posts for user {}",
        summary.posts_created, summary.user.id
    );
    Ok(())
}

/// Run the report command.
pub fn run_report(database: &Utf8Path, config: &Config, options: ReportOptions) -> Result<()> {
    let conn = db::init_db(database).context("failed to open database")?;
    let preset_tags = config.preset_tags()?;
    let weeks = match options.weeks {
        Some(weeks) => weeks,
        None => config.default_weeks()?,
    };
    let now = options.now.unwrap_or_else(Utc::now);
    let utc_offset = options.utc_offset.unwrap_or(UtcOffset::UTC);
    let source = SqlitePostSource::new(&conn);

    match &options.target {
        ReportTarget::User(selector) => {
            let user = resolve_user(&conn, selector)?;
            info!(
                user = %user.email,
                weeks = weeks.get(),
                %utc_offset,
                "building weekly reports"
            );

            let series = report::build_series(
                &source,
                user.id,
                now,
                options.utc_offset,
                weeks,
                &preset_tags,
            )
            .map_err(ReportError::Source)?;

            write_report(&options, &series, series.len(), || {
                render::format_series(&series)
            })
        }
        ReportTarget::AllUsers => {
            let users = db::list_users(&conn)?;
            info!(
                users = users.len(),
                weeks = weeks.get(),
                %utc_offset,
                "building weekly reports for all users"
            );

            let reports = report::build_series_for_users(
                &source,
                &users,
                now,
                options.utc_offset,
                weeks,
                &preset_tags,
            )
            .map_err(ReportError::Source)?;

            let week_total: usize = reports.iter().map(|r| r.weeks.len()).sum();
            write_report(&options, &reports, week_total, || {
                render::format_user_series(&reports)
            })
        }
    }
}

fn write_report<T: Serialize + ?Sized>(
    options: &ReportOptions,
    value: &T,
    week_total: usize,
    text: impl FnOnce() -> String,
) -> Result<()> {
    if let Some(output) = &options.output {
        render::export_json(value, output)?;
        println!("Exported {} weekly reports to {}.", week_total, output);
    } else if options.json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", text());
    }
    Ok(())
}

/// Run the summary command.
pub fn run_summary(
    database: &Utf8Path,
    config: &Config,
    user: &str,
    now: Option<DateTime<Utc>>,
    json: bool,
) -> Result<()> {
    let conn = db::init_db(database).context("failed to open database")?;
    let preset_tags = config.preset_tags()?;
    let user = resolve_user(&conn, user)?;

    let source = SqlitePostSource::new(&conn);
    let summary = report::build_rolling_summary(
        &source,
        user.id,
        now.unwrap_or_else(Utc::now),
        &preset_tags,
    )
    .map_err(ReportError::Source)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", render::format_summary(&summary));
    }
    Ok(())
}
