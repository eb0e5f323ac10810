// Blog content pipeline: slug resolution, post loading, indexing, rendering

pub mod front_matter;
pub mod index;
pub mod markdown;
pub mod slug;
pub mod store;
pub mod validate;

pub use markdown::render_markdown;
pub use slug::{SlugResolver, strip_locale_suffix};
pub use store::ContentStore;
pub use validate::{ValidationReport, validate_content};

use pigeon_site_core::{Locale, Post, Result};

/// Per-locale post collections, as consumed by the sitemap builder
pub trait PostSource {
    /// Every post of `locale`, newest first
    fn all_posts(&self, locale: &Locale) -> Result<Vec<Post>>;

    fn all_categories(&self, locale: &Locale) -> Result<Vec<String>> {
        Ok(index::categories(&self.all_posts(locale)?))
    }
}
