//! Resolution of a page's property bag into [`PostMetadata`].
//!
//! Each field is looked up through a [`PropertyRule`]: an ordered list of accepted
//! property names. The first name whose value is present and non-empty wins.

use chrono::{NaiveDate, Utc};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::warn;

use crate::model::{PageRecord, PropertyBag, PropertyValue};

pub const DEFAULT_TITLE: &str = "Untitled";

#[derive(Debug, Clone, Copy)]
pub struct PropertyRule {
    pub field: &'static str,
    pub names: &'static [&'static str],
}

pub const TITLE: PropertyRule = PropertyRule {
    field: "title",
    names: &["Title", "title", "Name"],
};
pub const SLUG: PropertyRule = PropertyRule {
    field: "slug",
    names: &["Slug", "slug"],
};
pub const PUBLISH_DATE: PropertyRule = PropertyRule {
    field: "publish_date",
    names: &["Publish Date", "Date", "Published"],
};
pub const TAGS: PropertyRule = PropertyRule {
    field: "tags",
    names: &["Tags", "tags"],
};
pub const DESCRIPTION: PropertyRule = PropertyRule {
    field: "description",
    names: &["Description", "Excerpt", "Summary"],
};
pub const COVER_IMAGE: PropertyRule = PropertyRule {
    field: "cover_image",
    names: &["Cover", "Cover Image"],
};
pub const CANONICAL_URL: PropertyRule = PropertyRule {
    field: "canonical_url",
    names: &["Canonical URL", "Canonical"],
};
pub const FEATURED: PropertyRule = PropertyRule {
    field: "featured",
    names: &["Featured"],
};

impl PropertyRule {
    /// Evaluate `accessor` against each accepted name in priority order.
    /// Returns the matching property name alongside the value.
    pub fn resolve<'a, T>(
        &self,
        bag: &'a PropertyBag,
        accessor: impl Fn(&'a PropertyValue) -> Option<T>,
    ) -> Option<(&'static str, T)> {
        self.names
            .iter()
            .find_map(|name| bag.get(*name).and_then(&accessor).map(|v| (*name, v)))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum MetadataError {
    #[error("property {property:?} holds an unparsable date {value:?}")]
    InvalidDate { property: String, value: String },
    #[error("no publish date property is set")]
    MissingDate,
    #[error("title {title:?} does not produce a usable slug")]
    EmptySlug { title: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostMetadata {
    pub title: String,
    pub slug: String,
    pub publish_date: NaiveDate,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub canonical_url: Option<String>,
    pub featured: bool,
}

impl PostMetadata {
    /// `{isoDate}-{slug}.md`, lowercase.
    pub fn file_name(&self) -> String {
        format!("{}-{}.md", self.publish_date.format("%Y-%m-%d"), self.slug).to_lowercase()
    }
}

#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    require_publish_date: bool,
    today: NaiveDate,
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new(false)
    }
}

impl MetadataExtractor {
    pub fn new(require_publish_date: bool) -> Self {
        Self {
            require_publish_date,
            today: Utc::now().date_naive(),
        }
    }

    /// Pin the date used when a page has none.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn extract(&self, page: &PageRecord) -> Result<PostMetadata, MetadataError> {
        let bag = &page.properties;

        let title = TITLE
            .resolve(bag, PropertyValue::text)
            .map(|(_, t)| t)
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let slug = match SLUG.resolve(bag, PropertyValue::text) {
            Some((_, explicit)) => slugify(&explicit),
            None => slugify(&title),
        };
        if slug.is_empty() {
            return Err(MetadataError::EmptySlug { title });
        }

        let publish_date = match PUBLISH_DATE.resolve(bag, PropertyValue::date_start) {
            Some((property, raw)) => parse_date(raw).ok_or_else(|| MetadataError::InvalidDate {
                property: property.to_string(),
                value: raw.to_string(),
            })?,
            None if self.require_publish_date => return Err(MetadataError::MissingDate),
            None => {
                warn!(page_id = %page.id, fallback = %self.today, "Page has no publish date, using today");
                self.today
            }
        };

        let mut tags: Vec<String> = Vec::new();
        for tag in TAGS
            .resolve(bag, PropertyValue::names)
            .map(|(_, names)| names)
            .unwrap_or_default()
        {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        let cover_image = COVER_IMAGE
            .resolve(bag, PropertyValue::url)
            .map(|(_, url)| url)
            .or_else(|| {
                page.cover
                    .as_ref()
                    .and_then(|c| c.url())
                    .map(str::to_string)
            });

        Ok(PostMetadata {
            title,
            slug,
            publish_date,
            tags,
            description: DESCRIPTION.resolve(bag, PropertyValue::text).map(|(_, d)| d),
            cover_image,
            canonical_url: CANONICAL_URL.resolve(bag, PropertyValue::url).map(|(_, u)| u),
            featured: FEATURED
                .resolve(bag, PropertyValue::checked)
                .map(|(_, f)| f)
                .unwrap_or(false),
        })
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn slug_patterns() -> &'static [(Regex, &'static str); 3] {
    static PATTERNS: OnceLock<[(Regex, &'static str); 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (Regex::new(r"[^a-z0-9_\s-]").expect("valid regex"), ""),
            (Regex::new(r"\s+").expect("valid regex"), "-"),
            (Regex::new(r"-+").expect("valid regex"), "-"),
        ]
    })
}

/// Lowercase, drop anything but word characters, whitespace and hyphens, then
/// collapse whitespace and hyphen runs into single hyphens.
pub fn slugify(text: &str) -> String {
    let mut slug = text.to_lowercase();
    for (pattern, replacement) in slug_patterns() {
        slug = pattern.replace_all(&slug, *replacement).into_owned();
    }
    slug.trim_matches('-').to_string()
}
