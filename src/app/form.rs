use strum::{EnumIter, IntoEnumIterator};
use thiserror::Error;
use time::macros::format_description;
use time::Date;
use unicode_segmentation::UnicodeSegmentation;

use crate::search::plain_text;
use crate::storage::NewPost;

pub const MIN_TITLE_LEN: usize = 3;
pub const MIN_CONTENT_LEN: usize = 10;
const MAX_FIELD_LEN: usize = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter)]
pub enum FormField {
    #[default]
    Title,
    Date,
    Categories,
    Content,
    Save,
    Cancel,
}

impl FormField {
    pub fn next(self) -> Self {
        let order: Vec<_> = FormField::iter().collect();
        let index = order.iter().position(|field| *field == self).unwrap_or(0);
        order[(index + 1) % order.len()]
    }

    pub fn previous(self) -> Self {
        let order: Vec<_> = FormField::iter().collect();
        let index = order.iter().position(|field| *field == self).unwrap_or(0);
        order[(index + order.len() - 1) % order.len()]
    }

    pub fn is_text(self) -> bool {
        !matches!(self, FormField::Save | FormField::Cancel)
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::Title => "Title",
            FormField::Date => "Date",
            FormField::Categories => "Categories",
            FormField::Content => "Content",
            FormField::Save => "Save",
            FormField::Cancel => "Cancel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Title should be at least 3 characters.")]
    TitleTooShort,
    #[error("Please select a date.")]
    MissingDate,
    #[error("Please enter the date as YYYY-MM-DD.")]
    InvalidDate,
    #[error("Content should be at least 10 characters.")]
    ContentTooShort,
}

impl FormError {
    pub fn field(self) -> FormField {
        match self {
            FormError::TitleTooShort => FormField::Title,
            FormError::MissingDate | FormError::InvalidDate => FormField::Date,
            FormError::ContentTooShort => FormField::Content,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostForm {
    pub title: String,
    pub date: String,
    pub categories: String,
    pub content: String,
    pub focus: FormField,
    pub error: Option<FormError>,
}

impl PostForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_previous(&mut self) {
        self.focus = self.focus.previous();
    }

    pub fn field_value(&self, field: FormField) -> Option<&str> {
        match field {
            FormField::Title => Some(&self.title),
            FormField::Date => Some(&self.date),
            FormField::Categories => Some(&self.categories),
            FormField::Content => Some(&self.content),
            FormField::Save | FormField::Cancel => None,
        }
    }

    fn focused_value_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Title => Some(&mut self.title),
            FormField::Date => Some(&mut self.date),
            FormField::Categories => Some(&mut self.categories),
            FormField::Content => Some(&mut self.content),
            FormField::Save | FormField::Cancel => None,
        }
    }

    pub fn push_char(&mut self, ch: char) {
        if let Some(value) = self.focused_value_mut() {
            if value.len() < MAX_FIELD_LEN {
                value.push(ch);
            }
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(value) = self.focused_value_mut() {
            if let Some((offset, _)) = value.grapheme_indices(true).next_back() {
                value.truncate(offset);
            }
        }
    }

    pub fn submit(&mut self) -> Result<NewPost, FormError> {
        match self.validate() {
            Ok(post) => {
                self.error = None;
                Ok(post)
            }
            Err(err) => {
                self.focus = err.field();
                self.error = Some(err);
                Err(err)
            }
        }
    }

    pub fn validate(&self) -> Result<NewPost, FormError> {
        validate_fields(&self.title, &self.date, &self.categories, &self.content)
    }
}

pub fn validate_fields(
    title: &str,
    date: &str,
    categories: &str,
    content: &str,
) -> Result<NewPost, FormError> {
    let title = title.trim();
    if title.graphemes(true).count() < MIN_TITLE_LEN {
        return Err(FormError::TitleTooShort);
    }

    let date = date.trim();
    if date.is_empty() {
        return Err(FormError::MissingDate);
    }
    let date = parse_date(date).ok_or(FormError::InvalidDate)?;

    let content = content.trim();
    if plain_text(content).trim().graphemes(true).count() < MIN_CONTENT_LEN {
        return Err(FormError::ContentTooShort);
    }

    Ok(NewPost {
        title: title.to_string(),
        date,
        content: content.to_string(),
        categories: split_categories(categories),
    })
}

pub fn parse_date(input: &str) -> Option<Date> {
    Date::parse(input.trim(), format_description!("[year]-[month]-[day]")).ok()
}

pub fn split_categories(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use time::macros::date;

    fn filled() -> PostForm {
        PostForm {
            title: "  A proper title ".into(),
            date: "2024-01-01".into(),
            categories: " Rust, ,Terminal ,".into(),
            content: "<p>Enough words in here.</p>".into(),
            ..PostForm::default()
        }
    }

    #[test]
    fn short_title_fails_first() {
        let mut form = PostForm {
            title: "Hi".into(),
            date: "2024-01-01".into(),
            content: "short".into(),
            focus: FormField::Content,
            ..PostForm::default()
        };
        assert_eq!(form.submit(), Err(FormError::TitleTooShort));
        assert_eq!(form.focus, FormField::Title);
        assert_eq!(
            form.error.map(|err| err.to_string()).as_deref(),
            Some("Title should be at least 3 characters.")
        );
    }

    #[test]
    fn date_rules_come_before_content() {
        let mut form = PostForm {
            title: "Valid".into(),
            ..PostForm::default()
        };
        assert_eq!(form.submit(), Err(FormError::MissingDate));
        assert_eq!(form.focus, FormField::Date);

        form.date = "21/06/2024".into();
        assert_eq!(form.submit(), Err(FormError::InvalidDate));

        form.date = "2024-06-21".into();
        form.content = "<p>&nbsp;tiny&nbsp;</p>".into();
        assert_eq!(form.submit(), Err(FormError::ContentTooShort));
        assert_eq!(form.focus, FormField::Content);
    }

    #[test]
    fn successful_submit_trims_and_splits() {
        let mut form = filled();
        let post = form.submit().expect("valid form");
        assert_eq!(post.title, "A proper title");
        assert_eq!(post.date, date!(2024 - 01 - 01));
        assert_eq!(post.categories, vec!["Rust", "Terminal"]);
        assert_eq!(post.content, "<p>Enough words in here.</p>");
        assert!(form.error.is_none());
    }

    #[test]
    fn focus_wraps_in_both_directions() {
        let mut form = PostForm::new();
        assert_eq!(form.focus, FormField::Title);
        form.focus_previous();
        assert_eq!(form.focus, FormField::Cancel);
        form.focus_next();
        assert_eq!(form.focus, FormField::Title);
        for _ in 0..4 {
            form.focus_next();
        }
        assert_eq!(form.focus, FormField::Save);
        assert!(!form.focus.is_text());
    }

    #[test]
    fn typing_edits_only_the_focused_text_field() {
        let mut form = PostForm::new();
        for ch in "Héllo".chars() {
            form.push_char(ch);
        }
        form.pop_char();
        assert_eq!(form.title, "Héll");

        form.focus = FormField::Save;
        form.push_char('x');
        assert_eq!(form.field_value(FormField::Save), None);
        assert_eq!(form.title, "Héll");

        form.reset();
        assert_eq!(form, PostForm::default());
    }

    #[test]
    fn category_split_drops_blanks() {
        assert!(split_categories(" , ,").is_empty());
        assert_matches!(split_categories("One").as_slice(), [only] if only == "One");
    }
}
