// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing and command dispatch.

use crate::{
    commands::{self, ReportOptions, ReportTarget},
    config,
    model::WeekCount,
    window::UtcOffset,
};
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, default_value = "activity.db", global = true)]
    database: Utf8PathBuf,

    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: Utf8PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Register a user
    AddUser {
        /// Email address, unique per user
        #[arg(long)]
        email: String,

        /// Display name
        #[arg(long)]
        name: String,
    },

    /// List registered users
    Users,

    /// Write a post
    Post {
        /// User id or email address of the author
        #[arg(short, long)]
        user: String,

        /// Post body
        content: String,

        /// Tag to attach (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Creation time as RFC 3339 (default: now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// List catalog tags with usage counts
    Tags,

    /// Generate sample posts for a user
    Seed {
        /// Email address of the user to seed (created if missing)
        #[arg(long, default_value = "sample@example.com")]
        email: String,

        /// Display name used when the user is created
        #[arg(long, default_value = "Sample User")]
        name: String,

        /// Number of trailing weeks to fill (default: from config)
        #[arg(short = 'n', long)]
        weeks: Option<u32>,

        /// Random seed, for reproducible data
        #[arg(long, default_value = "0")]
        rng_seed: u64,
    },

    /// Show per-week category breakdowns, most recent week first
    Report {
        /// User id or email address
        #[arg(short, long, required_unless_present = "all_users")]
        user: Option<String>,

        /// Report on every registered user
        #[arg(long, conflicts_with = "user")]
        all_users: bool,

        /// Number of weeks to show, 1 to 12 (default: from config)
        #[arg(short = 'n', long)]
        weeks: Option<WeekCount>,

        /// Local time offset from UTC in minutes, e.g. -480 (default: UTC)
        #[arg(long, allow_negative_numbers = true)]
        utc_offset: Option<UtcOffset>,

        /// Reference time as RFC 3339 (default: now)
        #[arg(long)]
        now: Option<DateTime<Utc>>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Write JSON to this file instead of printing
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
    },

    /// Show categories for the last 7 days
    Summary {
        /// User id or email address
        #[arg(short, long)]
        user: String,

        /// Reference time as RFC 3339 (default: now)
        #[arg(long)]
        now: Option<DateTime<Utc>>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// Parse arguments and dispatch to the appropriate command.
pub fn dispatch() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::AddUser { email, name } => {
            commands::run_add_user(&args.database, &email, &name)?;
        }
        Command::Users => {
            commands::run_users(&args.database)?;
        }
        Command::Post {
            user,
            content,
            tags,
            at,
        } => {
            commands::run_post(&args.database, &user, &content, &tags, at)?;
        }
        Command::Tags => {
            commands::run_tags(&args.database)?;
        }
        Command::Seed {
            email,
            name,
            weeks,
            rng_seed,
        } => {
            let config = config::Config::load_or_default(&args.config)
                .context("failed to load configuration")?;
            commands::run_seed(&args.database, &config, &email, &name, weeks, rng_seed)?;
        }
        Command::Report {
            user,
            all_users,
            weeks,
            utc_offset,
            now,
            json,
            output,
        } => {
            let config = config::Config::load_or_default(&args.config)
                .context("failed to load configuration")?;
            commands::run_report(
                &args.database,
                &config,
                ReportOptions {
                    target: match user {
                        Some(user) if !all_users => ReportTarget::User(user),
                        _ => ReportTarget::AllUsers,
                    },
                    weeks,
                    utc_offset,
                    now,
                    json,
                    output,
                },
            )?;
        }
        Command::Summary { user, now, json } => {
            let config = config::Config::load_or_default(&args.config)
                .context("failed to load configuration")?;
            commands::run_summary(&args.database, &config, &user, now, json)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_report_args() {
        let args = Args::try_parse_from([
            "bbs-activity-report",
            "report",
            "--user",
            "ada@example.com",
            "-n",
            "6",
            "--utc-offset",
            "-480",
        ])
        .unwrap();

        match args.command {
            Command::Report {
                user,
                weeks,
                utc_offset,
                ..
            } => {
                assert_eq!(user.as_deref(), Some("ada@example.com"));
                assert_eq!(weeks.map(WeekCount::get), Some(6));
                assert_eq!(utc_offset.map(UtcOffset::minutes), Some(-480));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_report_user_selection() {
        let args = Args::try_parse_from(["bbs-activity-report", "report", "--all-users"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Report {
                user: None,
                all_users: true,
                ..
            }
        ));

        let both = Args::try_parse_from([
            "bbs-activity-report",
            "report",
            "--all-users",
            "-u",
            "ada@example.com",
        ]);
        assert!(both.is_err());

        let neither = Args::try_parse_from(["bbs-activity-report", "report"]);
        assert!(neither.is_err());
    }

    #[test]
    fn test_week_count_out_of_range_is_rejected() {
        let result = Args::try_parse_from(["bbs-activity-report", "report", "-u", "x", "-n", "13"]);
        assert!(result.is_err());
    }
}
