use pigeon_site_core::{Locale, Post, Result, SiteConfig, UniversalSlugMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::PostSource;
use crate::front_matter::parse_document;
use crate::index;
use crate::slug::{SlugResolver, strip_locale_suffix};

/// Directory of `<slug>.<locale>.md` files.
///
/// Nothing is cached: every call goes back to the file system, so edits
/// show up on the next request.
#[derive(Debug, Clone)]
pub struct ContentStore {
    posts_dir: PathBuf,
    pages_dir: PathBuf,
    universal_slugs: UniversalSlugMap,
    fallback_locale: Locale,
}

impl ContentStore {
    pub fn new(
        posts_dir: impl Into<PathBuf>,
        pages_dir: impl Into<PathBuf>,
        universal_slugs: UniversalSlugMap,
        fallback_locale: Locale,
    ) -> Self {
        Self {
            posts_dir: posts_dir.into(),
            pages_dir: pages_dir.into(),
            universal_slugs,
            fallback_locale,
        }
    }

    /// Store rooted at `site_root` using the directories from site.toml
    pub fn from_config(config: &SiteConfig, site_root: &Path) -> Self {
        Self::new(
            site_root.join(&config.site.content_dir),
            site_root.join(&config.site.pages_dir),
            config.universal_slugs.clone(),
            config.default_locale().clone(),
        )
    }

    pub fn posts_dir(&self) -> &Path {
        &self.posts_dir
    }

    pub fn pages_dir(&self) -> &Path {
        &self.pages_dir
    }

    pub fn resolver(&self) -> SlugResolver<'_> {
        SlugResolver::new(&self.universal_slugs, &self.fallback_locale)
    }

    /// Resolve a requested slug to the base file name on disk
    pub fn real_slug(&self, slug: &str, locale: Option<&Locale>) -> String {
        self.resolver().real_slug(slug, locale)
    }

    /// File names (`<slug>.<locale>.md`) of every post written in `locale`
    pub fn post_file_names(&self, locale: &Locale) -> Result<Vec<String>> {
        let suffix = format!(".{}.md", locale);
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.posts_dir)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str()
                && name.ends_with(&suffix)
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Load a post by its public slug.
    ///
    /// `Ok(None)` means the file does not exist; I/O failures other than
    /// absence and malformed front matter are errors.
    pub fn post_by_slug(&self, slug: &str, locale: Option<&Locale>) -> Result<Option<Post>> {
        let real_slug = self.real_slug(slug, locale);
        load_document(&self.posts_dir, &real_slug, locale)
    }

    /// Like [`post_by_slug`](Self::post_by_slug), retrying without a locale
    /// suffix when the localized file is missing
    pub fn post_with_fallback(&self, slug: &str, locale: &Locale) -> Result<Option<Post>> {
        match self.post_by_slug(slug, Some(locale))? {
            Some(post) => Ok(Some(post)),
            None => self.post_by_slug(slug, None),
        }
    }

    /// Every post of `locale`, newest first
    pub fn all_posts(&self, locale: &Locale) -> Result<Vec<Post>> {
        debug!(locale = %locale, "Fetching posts");
        let mut posts = Vec::new();
        for name in self.post_file_names(locale)? {
            let base = strip_locale_suffix(&name);
            if let Some(post) = self.post_with_fallback(base, locale)? {
                posts.push(post);
            }
        }
        index::sort_by_date_desc(&mut posts);
        Ok(posts)
    }

    /// Every post of `locale` that loads, newest first.
    ///
    /// A file that fails to load is logged and left out. Only failing to
    /// list the directory is an error.
    pub fn readable_posts(&self, locale: &Locale) -> Result<Vec<Post>> {
        let mut posts = Vec::new();
        for name in self.post_file_names(locale)? {
            let base = strip_locale_suffix(&name);
            match self.post_with_fallback(base, locale) {
                Ok(Some(post)) => posts.push(post),
                Ok(None) => {}
                Err(e) => warn!(file = %name, error = %e, "Skipping unreadable post"),
            }
        }
        index::sort_by_date_desc(&mut posts);
        Ok(posts)
    }

    /// The `limit` most recent posts
    pub fn latest_posts(&self, locale: &Locale, limit: usize) -> Result<Vec<Post>> {
        let posts = self.all_posts(locale)?;
        Ok(index::latest(&posts, limit).to_vec())
    }

    /// The `limit` most recent posts of one category
    pub fn latest_posts_by_category(
        &self,
        category: &str,
        locale: &Locale,
        limit: usize,
    ) -> Result<Vec<Post>> {
        let posts = self.all_posts(locale)?;
        Ok(index::latest_in_category(&posts, category, limit)
            .into_iter()
            .cloned()
            .collect())
    }

    /// All posts of one category, newest first
    pub fn posts_in_category(&self, category: &str, locale: &Locale) -> Result<Vec<Post>> {
        let posts = self.all_posts(locale)?;
        Ok(index::in_category(&posts, category)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Distinct categories of `locale`, in order of first appearance
    pub fn all_categories(&self, locale: &Locale) -> Result<Vec<String>> {
        Ok(index::categories(&self.all_posts(locale)?))
    }

    /// Static page body (`home`, `about`, ...) with a locale-agnostic fallback
    pub fn page(&self, name: &str, locale: &Locale) -> Result<Option<Post>> {
        match load_document(&self.pages_dir, name, Some(locale))? {
            Some(page) => Ok(Some(page)),
            None => load_document(&self.pages_dir, name, None),
        }
    }
}

/// Listings skip unreadable files, so the sitemap matches the pages a build
/// writes
impl PostSource for ContentStore {
    fn all_posts(&self, locale: &Locale) -> Result<Vec<Post>> {
        self.readable_posts(locale)
    }
}

/// `<slug>.<locale>.md`, or `<slug>.md` without a locale
pub fn post_file_name(slug: &str, locale: Option<&Locale>) -> String {
    match locale {
        Some(locale) => format!("{}.{}.md", slug, locale),
        None => format!("{}.md", slug),
    }
}

/// Slugs come from URLs; anything that could leave the directory is refused
fn is_safe_slug(slug: &str) -> bool {
    !slug.trim().is_empty()
        && !slug.contains(['/', '\\', '\0'])
        && !slug.contains("..")
}

fn load_document(dir: &Path, slug: &str, locale: Option<&Locale>) -> Result<Option<Post>> {
    if !is_safe_slug(slug) {
        debug!(slug, "Rejected unsafe slug");
        return Ok(None);
    }

    let file_name = post_file_name(slug, locale);
    debug!(file = %file_name, locale = ?locale.map(Locale::as_str), "Fetching post");

    let path = dir.join(&file_name);
    let source = match fs::read_to_string(&path) {
        Ok(source) => source,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let (metadata, content) = parse_document(&source, &path)?;
    Ok(Some(Post {
        slug: slug.to_string(),
        locale: locale.cloned(),
        metadata,
        content,
    }))
}
