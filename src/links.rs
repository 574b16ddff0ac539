//! Link registry: an ordered list of named links, unique by slug.
//!
//! The functions here are pure list transformations; the hub actor performs
//! the read-modify-write against its store.

use serde::{Deserialize, Serialize};

/// Store key holding the full link list.
pub const LINKS_KEY: &str = "links";

// ============================================================================
// Types
// ============================================================================

/// A named link, unique by `slug`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub title: String,
    pub url: String,
    pub slug: String,
    #[serde(default)]
    pub desc: String,
}

/// Body of `POST /links`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewLink {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
}

/// Rejection of a `NewLink`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("missing title or url")]
    MissingField,
    #[error("title '{0}' does not produce a usable slug")]
    EmptySlug(String),
}

impl NewLink {
    /// Validate and resolve into a record, deriving the slug from the title
    /// when none is supplied.
    pub fn into_record(self) -> Result<LinkRecord, LinkError> {
        let title = present(self.title).ok_or(LinkError::MissingField)?;
        let url = present(self.url).ok_or(LinkError::MissingField)?;
        let slug = match present(self.slug) {
            Some(slug) => slug,
            None => slugify(&title),
        };
        if slug.is_empty() {
            return Err(LinkError::EmptySlug(title));
        }

        Ok(LinkRecord {
            title,
            url,
            slug,
            desc: self.desc.unwrap_or_default(),
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// ============================================================================
// Operations
// ============================================================================

/// Lowercase, collapse every run of characters outside `[a-z0-9]` into one
/// `-`, then strip leading and trailing `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Replace-by-slug: drop any record sharing `record.slug`, then append.
///
/// Returns the resolved slug.
pub fn upsert(links: &mut Vec<LinkRecord>, record: LinkRecord) -> String {
    links.retain(|l| l.slug != record.slug);
    let slug = record.slug.clone();
    links.push(record);
    slug
}

/// Remove every record with `slug`. Absent slugs are not an error.
pub fn remove(links: &mut Vec<LinkRecord>, slug: &str) {
    links.retain(|l| l.slug != slug);
}

/// Links seeded into a store that has never held a link list.
pub fn default_links() -> Vec<LinkRecord> {
    [
        ("Home", "https://mrrainbowsmoke.com", "home", "Primary domain"),
        ("Blog", "https://blog.mrrainbowsmoke.com", "blog", "Blog and posts"),
        (
            "Projects",
            "https://projects.mrrainbowsmoke.com",
            "projects",
            "Projects and experiments",
        ),
    ]
    .into_iter()
    .map(|(title, url, slug, desc)| LinkRecord {
        title: title.to_string(),
        url: url.to_string(),
        slug: slug.to_string(),
        desc: desc.to_string(),
    })
    .collect()
}
