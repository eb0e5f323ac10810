//! Derived views over a locale's post collection.
//!
//! All functions take the collection already sorted by
//! [`sort_by_date_desc`] and keep its order.

use pigeon_site_core::Post;

/// Newest first, comparing `date` as plain strings.
///
/// Dates are expected as zero-padded `YYYY-MM-DD`; anything else sorts
/// wherever its characters put it. The sort is stable, so equal dates keep
/// their input order. Posts without a date sort last.
pub fn sort_by_date_desc(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.date().cmp(a.date()));
}

/// The first `limit` posts
pub fn latest(posts: &[Post], limit: usize) -> &[Post] {
    &posts[..limit.min(posts.len())]
}

pub fn in_category<'a>(posts: &'a [Post], category: &str) -> Vec<&'a Post> {
    posts
        .iter()
        .filter(|post| post.category() == Some(category))
        .collect()
}

pub fn latest_in_category<'a>(posts: &'a [Post], category: &str, limit: usize) -> Vec<&'a Post> {
    posts
        .iter()
        .filter(|post| post.category() == Some(category))
        .take(limit)
        .collect()
}

/// Distinct non-empty categories in order of first appearance
pub fn categories(posts: &[Post]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for category in posts.iter().filter_map(Post::category) {
        if !seen.iter().any(|c| c == category) {
            seen.push(category.to_string());
        }
    }
    seen
}
