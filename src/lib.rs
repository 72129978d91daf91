// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Weekly activity reports for a personal micro-blog.
//!
//! Posts are bucketed into local Monday-Sunday weeks and classified into a
//! configured set of preset tags plus a catch-all "other" category.

pub mod categorize;
pub mod commands;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod render;
pub mod report;
pub mod seed;
pub mod window;
