use std::fmt::Write as _;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{escape_html, format_date};
use crate::search::plain_text;
use crate::storage::PostRecord;

static BREAK_TAGS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|h[1-6]|li|ul|ol|blockquote|pre)\s*>|<(ul|ol)\b[^>]*>")
        .expect("valid block tag pattern")
});
static LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<li\b[^>]*>").expect("valid list item pattern"));

pub const BULLET: &str = "• ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDetail {
    pub id: i64,
    pub title: String,
    pub date_label: String,
    pub content_html: String,
    pub categories: Vec<String>,
    pub lines: Vec<String>,
}

impl PostDetail {
    pub fn find(posts: &[PostRecord], id: i64) -> Option<Self> {
        posts.iter().find(|post| post.id == id).map(Self::from_record)
    }

    pub fn from_record(post: &PostRecord) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            date_label: format_date(post.date),
            content_html: post.content.clone(),
            categories: post.categories.clone(),
            lines: plain_lines(&post.content),
        }
    }
}

pub fn plain_lines(markup: &str) -> Vec<String> {
    let bulleted = LIST_ITEM.replace_all(markup, "\n• ");
    let broken = BREAK_TAGS.replace_all(&bulleted, "\n");
    plain_text(&broken)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != BULLET.trim())
        .map(str::to_string)
        .collect()
}

pub fn render_detail_html(detail: &PostDetail) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<article class="post-detail" data-id="{id}" tabindex="-1"><h2 class="detail-title">{title}</h2><p class="detail-date">{date}</p><div class="detail-content">{content}</div><div class="detail-categories">"#,
        id = detail.id,
        title = escape_html(&detail.title),
        date = detail.date_label,
        content = detail.content_html,
    );
    for category in &detail.categories {
        let _ = write!(html, "<span>{}</span>", escape_html(category));
    }
    html.push_str("</div></article>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn record() -> PostRecord {
        PostRecord {
            id: 2,
            title: "Exploring JavaScript".into(),
            date: date!(2024 - 06 - 22),
            content: "<p>Intro line.</p><ul><li>Dynamic</li><li>Fast &amp; loose</li></ul>".into(),
            categories: vec!["JavaScript".into(), "Programming".into()],
        }
    }

    #[test]
    fn missing_id_yields_nothing() {
        assert!(PostDetail::find(&[record()], 99).is_none());
        assert_eq!(PostDetail::find(&[record()], 2).map(|d| d.id), Some(2));
    }

    #[test]
    fn plain_lines_break_blocks_and_bullet_items() {
        let detail = PostDetail::from_record(&record());
        assert_eq!(
            detail.lines,
            vec!["Intro line.", "• Dynamic", "• Fast & loose"]
        );
        assert_eq!(detail.date_label, "June 22, 2024");
        assert_eq!(plain_lines("one<br>two<BR/>three"), vec!["one", "two", "three"]);
    }

    #[test]
    fn detail_html_keeps_content_unescaped() {
        let html = render_detail_html(&PostDetail::from_record(&record()));
        insta::assert_snapshot!(html, @r#"<article class="post-detail" data-id="2" tabindex="-1"><h2 class="detail-title">Exploring JavaScript</h2><p class="detail-date">June 22, 2024</p><div class="detail-content"><p>Intro line.</p><ul><li>Dynamic</li><li>Fast &amp; loose</li></ul></div><div class="detail-categories"><span>JavaScript</span><span>Programming</span></div></article>"#);
    }
}
