use std::fmt::Write as _;

use super::{aria_label, escape_html, excerpt, format_date, EXCERPT_LEN};
use crate::app::pagination::Pagination;
use crate::storage::PostRecord;

pub const EMPTY_MESSAGE: &str = "No posts found.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub title_html: String,
    pub date_label: String,
    pub excerpt: String,
    pub aria_label: String,
}

impl PostSummary {
    pub fn from_record(post: &PostRecord) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            title_html: escape_html(&post.title),
            date_label: format_date(post.date),
            excerpt: excerpt(&post.content, EXCERPT_LEN),
            aria_label: aria_label(&post.title, post.date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPage {
    pub summaries: Vec<PostSummary>,
    pub page_label: String,
    pub has_previous: bool,
    pub has_next: bool,
}

impl ListPage {
    pub fn build(filtered: &[PostRecord], pagination: &Pagination) -> Self {
        Self {
            summaries: pagination
                .slice(filtered)
                .iter()
                .map(PostSummary::from_record)
                .collect(),
            page_label: pagination.label(),
            has_previous: pagination.has_previous(),
            has_next: pagination.has_next(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}

pub fn render_list_html(page: &ListPage) -> String {
    let mut html = String::new();
    if page.is_empty() {
        let _ = write!(html, r#"<p class="no-posts">{EMPTY_MESSAGE}</p>"#);
    } else {
        html.push_str(r#"<ul class="posts-list" role="list">"#);
        for summary in &page.summaries {
            let _ = write!(
                html,
                r#"<li class="post-preview" tabindex="0" role="listitem" data-id="{id}" aria-label="{aria}"><h3 class="post-title">{title}</h3><p class="post-meta">{date}</p><p class="post-excerpt">{excerpt}</p></li>"#,
                id = summary.id,
                aria = escape_html(&summary.aria_label),
                title = summary.title_html,
                date = summary.date_label,
                excerpt = escape_html(&summary.excerpt),
            );
        }
        html.push_str("</ul>");
    }
    let _ = write!(
        html,
        r#"<nav class="pagination"><button class="prev"{prev}>Previous</button><span class="pagination-info">{label}</span><button class="next"{next}>Next</button></nav>"#,
        prev = if page.has_previous { "" } else { " disabled" },
        label = page.page_label,
        next = if page.has_next { "" } else { " disabled" },
    );
    html
}
