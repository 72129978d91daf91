// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification of posts into preset-tag categories.

use crate::model::{Category, CategoryBucket, PostId, PostRecord, PresetTags};
use std::collections::HashSet;

/// Partition `posts` into one bucket per matched preset tag plus "other".
///
/// A post is appended to every distinct preset bucket one of its tags names,
/// at most once per bucket. Posts without tags, or whose tags are all outside
/// the preset list, land in "other" exactly once. Buckets come back in preset
/// declaration order followed by "other"; empty buckets are left out.
pub fn categorize(posts: &[PostRecord], preset_tags: &PresetTags) -> Vec<CategoryBucket> {
    let mut preset_buckets: Vec<Vec<PostRecord>> = vec![Vec::new(); preset_tags.len()];
    let mut placed: Vec<HashSet<PostId>> = vec![HashSet::new(); preset_tags.len()];
    let mut other = Vec::new();
    // Posts that no longer need the "other" bucket.
    let mut processed: HashSet<PostId> = HashSet::new();

    for post in posts {
        let mut matched_preset = false;
        for tag in &post.tags {
            let Some(index) = preset_tags.position(tag) else {
                continue;
            };
            matched_preset = true;
            if placed[index].insert(post.id) {
                preset_buckets[index].push(post.clone());
            }
        }

        if matched_preset {
            processed.insert(post.id);
        } else if processed.insert(post.id) {
            other.push(post.clone());
        }
    }

    let mut buckets: Vec<CategoryBucket> = preset_tags
        .iter()
        .zip(preset_buckets)
        .filter(|(_, posts)| !posts.is_empty())
        .map(|(tag, posts)| CategoryBucket::new(Category::Preset(tag.to_string()), posts))
        .collect();

    if !other.is_empty() {
        buckets.push(CategoryBucket::new(Category::Other, other));
    }

    buckets
}

/// Order buckets by post count, largest first.
///
/// The sort is stable, so buckets with equal counts keep the order
/// [`categorize`] produced them in.
pub fn sort_by_count(buckets: &mut [CategoryBucket]) {
    buckets.sort_by(|a, b| b.count.cmp(&a.count));
}
