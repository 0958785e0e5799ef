use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::storage::PostRecord;

static TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid markup tag pattern"));

const ENTITIES: [(&str, &str); 6] = [
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&amp;", "&"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(ascii_case_insensitive)]
pub enum SortOrder {
    #[strum(serialize = "asc", serialize = "ascending", serialize = "oldest")]
    Ascending,
    #[default]
    #[strum(serialize = "desc", serialize = "descending", serialize = "newest")]
    Descending,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::Ascending => "Oldest first",
            SortOrder::Descending => "Newest first",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl CategoryFilter {
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            CategoryFilter::All
        } else {
            CategoryFilter::Named(trimmed.to_string())
        }
    }

    pub fn matches(&self, post: &PostRecord) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Named(name) => post.has_category(name),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CategoryFilter::All => "All categories",
            CategoryFilter::Named(name) => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search: String,
    pub category: CategoryFilter,
    pub sort: SortOrder,
}

impl FilterCriteria {
    pub fn new(search: impl Into<String>, category: CategoryFilter, sort: SortOrder) -> Self {
        Self {
            search: search.into(),
            category,
            sort,
        }
    }

    fn needle(&self) -> Option<String> {
        let trimmed = self.search.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
    }
}

pub fn apply(posts: &[PostRecord], criteria: &FilterCriteria) -> Vec<PostRecord> {
    let needle = criteria.needle();
    let mut filtered: Vec<PostRecord> = posts
        .iter()
        .filter(|post| criteria.category.matches(post))
        .filter(|post| match &needle {
            None => true,
            Some(needle) => matches_text(post, needle),
        })
        .cloned()
        .collect();

    match criteria.sort {
        SortOrder::Ascending => filtered.sort_by(|a, b| a.date.cmp(&b.date)),
        SortOrder::Descending => filtered.sort_by(|a, b| b.date.cmp(&a.date)),
    }
    filtered
}

fn matches_text(post: &PostRecord, needle: &str) -> bool {
    post.title.to_lowercase().contains(needle)
        || strip_markup(&post.content).to_lowercase().contains(needle)
}

pub fn strip_markup(markup: &str) -> String {
    TAG_PATTERN.replace_all(markup, "").into_owned()
}

pub fn plain_text(markup: &str) -> String {
    decode_entities(&strip_markup(markup))
}

pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut decoded = text.to_string();
    for (entity, replacement) in ENTITIES {
        decoded = decoded.replace(entity, replacement);
    }
    decoded
}
