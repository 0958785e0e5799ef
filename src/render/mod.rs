use time::macros::format_description;
use time::Date;

use crate::search::plain_text;

pub mod detail;
pub mod list;

pub use detail::{render_detail_html, PostDetail};
pub use list::{render_list_html, ListPage, PostSummary};

pub const EXCERPT_LEN: usize = 140;
const ELLIPSIS: char = '…';

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn format_date(date: Date) -> String {
    date.format(format_description!(
        "[month repr:long] [day padding:none], [year]"
    ))
    .unwrap_or_else(|_| date.to_string())
}

pub fn excerpt(markup: &str, len: usize) -> String {
    let text = plain_text(markup);
    let text = text.trim();
    if text.chars().count() <= len {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(len).collect();
    cut.push(ELLIPSIS);
    cut
}

pub fn aria_label(title: &str, date: Date) -> String {
    format!("Post: {title}. Published on {}.", format_date(date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn formats_dates_in_long_form() {
        assert_eq!(format_date(date!(2024 - 06 - 21)), "June 21, 2024");
        assert_eq!(format_date(date!(2023 - 01 - 05)), "January 5, 2023");
    }

    #[test]
    fn escapes_the_five_special_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn long_excerpts_are_cut_to_exactly_141_chars() {
        let body = format!("<p>{}</p>", "é".repeat(300));
        let cut = excerpt(&body, EXCERPT_LEN);
        assert_eq!(cut.chars().count(), 141);
        assert!(cut.ends_with('…'));

        let short = excerpt("<p>  short text  </p>", EXCERPT_LEN);
        assert_eq!(short, "short text");
    }

    #[test]
    fn aria_label_mentions_title_and_date() {
        assert_eq!(
            aria_label("Welcome", date!(2024 - 06 - 21)),
            "Post: Welcome. Published on June 21, 2024."
        );
    }
}
