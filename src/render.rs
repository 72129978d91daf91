// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text and JSON rendering of reports.

use crate::model::{CategoryBucket, User, UserWeeklyReports, WeeklyReport};
use anyhow::{Context, Result};
use camino::Utf8Path;
use serde::Serialize;
use std::{fs::File, io::Write};

/// Render a report series as a plain-text table, one block per week.
pub fn format_series(series: &[WeeklyReport]) -> String {
    let mut out = String::new();

    if series.is_empty() {
        out.push_str("No activity in the requested weeks.\n");
        return out;
    }

    for report in series {
        let total: usize = report.categories.iter().map(|c| c.count).sum();
        out.push_str(&format!(
            "\nWeek {} to {} ({} posts)\n",
            report.week_start, report.week_end, total
        ));
        push_categories(&mut out, &report.categories);
    }

    out
}

/// Render an all-users report, one heading per user.
pub fn format_user_series(reports: &[UserWeeklyReports]) -> String {
    let mut out = String::new();

    if reports.is_empty() {
        out.push_str("No activity for any user in the requested weeks.\n");
        return out;
    }

    for report in reports {
        let heading = format!("{} <{}>", report.user.name, report.user.email);
        out.push_str(&format!("\n{}\n{}\n", heading, "-".repeat(heading.len())));
        out.push_str(&format_series(&report.weeks));
    }

    out
}

/// Render a rolling summary as a plain-text table.
pub fn format_summary(categories: &[CategoryBucket]) -> String {
    let mut out = String::new();
    if categories.is_empty() {
        out.push_str("No posts in the last 7 days.\n");
        return out;
    }

    out.push_str("\nLast 7 days\n");
    push_categories(&mut out, categories);
    out
}

fn push_categories(out: &mut String, categories: &[CategoryBucket]) {
    out.push_str(&format!("{:<20} {:>8}\n", "Category", "Posts"));
    out.push_str(&format!("{}\n", "=".repeat(29)));
    for category in categories {
        out.push_str(&format!("{:<20} {:>8}\n", category.tag, category.count));
    }
}

/// Render users as a plain-text table.
pub fn format_users(users: &[User]) -> String {
    let mut out = format!("\n{:<36}  {:<30} {}\n", "Id", "Email", "Name");
    out.push_str(&format!("{}\n", "=".repeat(80)));
    for user in users {
        out.push_str(&format!(
            "{:<36}  {:<30} {}\n",
            user.id.to_string(),
            user.email,
            user.name
        ));
    }
    out
}

/// Render the tag catalog with usage counts.
pub fn format_tags(tags: &[(String, u64)]) -> String {
    let mut out = format!("\n{:<20} {:>8}\n", "Tag", "Posts");
    out.push_str(&format!("{}\n", "=".repeat(29)));
    for (name, uses) in tags {
        out.push_str(&format!("{:<20} {:>8}\n", name, uses));
    }
    out
}

/// Write `value` as pretty-printed JSON to `output`.
pub fn export_json<T: Serialize + ?Sized>(value: &T, output: &Utf8Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;

    let mut file = File::create(output.as_std_path())
        .with_context(|| format!("failed to create file at {}", output))?;
    file.write_all(json.as_bytes())
        .with_context(|| format!("failed to write {}", output))?;

    Ok(())
}
