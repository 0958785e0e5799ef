use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub matched: bool,
}

pub fn search_regex(search: &str) -> Option<Regex> {
    let needle = search.trim();
    if needle.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .build()
        .ok()
}

pub fn segments<'a>(text: &'a str, matcher: Option<&Regex>) -> Vec<Segment<'a>> {
    let Some(matcher) = matcher else {
        return vec![Segment {
            text,
            matched: false,
        }];
    };
    let mut out = Vec::new();
    let mut cursor = 0;
    for found in matcher.find_iter(text) {
        if found.start() > cursor {
            out.push(Segment {
                text: &text[cursor..found.start()],
                matched: false,
            });
        }
        out.push(Segment {
            text: found.as_str(),
            matched: true,
        });
        cursor = found.end();
    }
    if cursor < text.len() || out.is_empty() {
        out.push(Segment {
            text: &text[cursor..],
            matched: false,
        });
    }
    out
}
