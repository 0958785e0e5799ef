use time::macros::date;

use super::PostRecord;

pub(super) fn seed_posts() -> Vec<PostRecord> {
    vec![
        PostRecord {
            id: 1,
            title: "Welcome to Vivid Blog".into(),
            date: date!(2024 - 06 - 21),
            content: "<p>This blog uses <strong>rich text editing</strong> and has advanced features for a vivid experience!</p>".into(),
            categories: vec!["Welcome".into(), "Intro".into()],
        },
        PostRecord {
            id: 2,
            title: "Exploring JavaScript".into(),
            date: date!(2024 - 06 - 22),
            content: "<p>JavaScript is awesome. Here's a quick overview of why it's so popular for modern web apps.</p><ul><li>Dynamic language</li><li>Runs in browsers</li><li>Huge ecosystem</li></ul>".into(),
            categories: vec!["JavaScript".into(), "Programming".into()],
        },
        PostRecord {
            id: 3,
            title: "Styling with CSS".into(),
            date: date!(2024 - 06 - 23),
            content: "<p>CSS makes web pages come alive with colors, layouts, and animations. Master it well!</p>".into(),
            categories: vec!["CSS".into(), "Web Design".into()],
        },
    ]
}
