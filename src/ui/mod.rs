use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use regex::Regex;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::form::{FormField, PostForm};
use crate::app::state::{AppState, OverlayState, View};
use crate::highlight::{search_regex, segments};
use crate::render::list::EMPTY_MESSAGE;
use crate::render::{PostDetail, PostSummary};
use crate::theme::DisplayMode;

#[derive(Debug, Clone, Copy)]
struct Palette {
    base: Style,
    accent: Color,
    muted: Color,
    highlight: Color,
    selection: Style,
    error: Color,
}

impl Palette {
    fn for_mode(mode: DisplayMode) -> Self {
        match mode {
            DisplayMode::Dark => Self {
                base: Style::default().fg(Color::Gray).bg(Color::Black),
                accent: Color::Cyan,
                muted: Color::DarkGray,
                highlight: Color::Yellow,
                selection: Style::default().bg(Color::Blue).fg(Color::Black),
                error: Color::LightRed,
            },
            DisplayMode::Light => Self {
                base: Style::default().fg(Color::Black).bg(Color::White),
                accent: Color::Blue,
                muted: Color::Gray,
                highlight: Color::Magenta,
                selection: Style::default().bg(Color::LightBlue).fg(Color::Black),
                error: Color::Red,
            },
        }
    }
}

pub fn draw_app(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let palette = Palette::for_mode(state.display_mode());
    frame.render_widget(Block::default().style(palette.base), frame.size());

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(frame.size());

    draw_header(frame, vertical[0], state, &palette);
    match state.view() {
        View::List => draw_list(frame, vertical[1], state, list_state, &palette),
        View::Detail { scroll, .. } => match state.current_detail() {
            Some(detail) => draw_detail(frame, vertical[1], &detail, scroll, &palette),
            None => draw_list(frame, vertical[1], state, list_state, &palette),
        },
    }

    let status = Paragraph::new(build_status_line(state, &palette))
        .block(Block::default().borders(Borders::TOP))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, vertical[2]);

    render_overlay(frame, state, &palette);
}

fn draw_header(frame: &mut Frame, area: Rect, state: &AppState, palette: &Palette) {
    let criteria = state.criteria();
    let search_text = if state.is_search_active() {
        format!("{}▌", state.search().input)
    } else if criteria.search.is_empty() {
        "(none)".to_string()
    } else {
        criteria.search.clone()
    };
    let search_style = if state.is_search_active() {
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let line = Line::from(vec![
        Span::styled(
            "Vivid Blog",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  Search: "),
        Span::styled(search_text, search_style),
        Span::raw("  Category: "),
        Span::styled(
            criteria.category.label().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  Sort: "),
        Span::styled(
            criteria.sort.label(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            state.display_mode().toggle_label(),
            Style::default().fg(palette.muted),
        ),
    ]);
    let header = Paragraph::new(line).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

fn draw_list(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    list_state: &mut ListState,
    palette: &Palette,
) {
    let page = state.current_page();
    let title = format!(" Posts ({}) • {} ", state.filtered().len(), page.page_label);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent));

    if page.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            EMPTY_MESSAGE,
            Style::default()
                .fg(palette.muted)
                .add_modifier(Modifier::ITALIC),
        )))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let matcher = search_regex(&state.criteria().search);
    let excerpt_width = area.width.saturating_sub(6) as usize;
    let items: Vec<ListItem> = page
        .summaries
        .iter()
        .map(|summary| summary_item(summary, matcher.as_ref(), excerpt_width, palette))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(palette.selection)
        .highlight_symbol("▶ ");
    frame.render_stateful_widget(list, area, list_state);
}

fn summary_item(
    summary: &PostSummary,
    matcher: Option<&Regex>,
    excerpt_width: usize,
    palette: &Palette,
) -> ListItem<'static> {
    let title = highlight_line(
        &summary.title,
        matcher,
        Style::default()
            .fg(palette.highlight)
            .add_modifier(Modifier::BOLD),
        Style::default().add_modifier(Modifier::BOLD),
    );
    ListItem::new(vec![
        Line::from(title),
        Line::from(Span::styled(
            summary.date_label.clone(),
            Style::default().fg(palette.muted),
        )),
        Line::from(truncate_to_width(&summary.excerpt, excerpt_width)),
        Line::from(""),
    ])
}

fn draw_detail(frame: &mut Frame, area: Rect, detail: &PostDetail, scroll: u16, palette: &Palette) {
    let mut lines = vec![
        Line::from(Span::styled(
            detail.date_label.clone(),
            Style::default().fg(palette.muted),
        )),
        Line::from(""),
    ];
    lines.extend(detail.lines.iter().map(|line| Line::from(line.clone())));
    if !detail.categories.is_empty() {
        lines.push(Line::from(""));
        let mut tags = Vec::with_capacity(detail.categories.len() * 2);
        for category in &detail.categories {
            tags.push(Span::styled(
                format!("[{category}]"),
                Style::default().fg(palette.accent),
            ));
            tags.push(Span::raw(" "));
        }
        lines.push(Line::from(tags));
    }

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(format!(" {} ", detail.title))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent)),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn build_status_line(state: &AppState, palette: &Palette) -> Text<'static> {
    let pagination = state.pagination();
    let mut spans = vec![
        Span::raw(format!("Posts: {} ", state.store().len())),
        Span::raw(" | Showing: "),
        Span::styled(
            state.filtered().len().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::styled(
            pagination.label(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ];
    if let Some(message) = state.status_message() {
        let is_error = state
            .new_post_form()
            .and_then(|form| form.error)
            .is_some();
        let style = if is_error {
            Style::default()
                .fg(palette.error)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.accent)
        };
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(message.to_string(), style));
    }

    let hints = match state.view() {
        View::List => "j/k move • Enter open • h/l page • / search • c category • s sort • a add • m mode • q quit",
        View::Detail { .. } => "j/k scroll • g top • Esc back • a add • m mode • q quit",
    };
    Text::from(vec![
        Line::from(spans),
        Line::from(Span::styled(hints, Style::default().fg(palette.muted))),
    ])
}

fn render_overlay(frame: &mut Frame, state: &AppState, palette: &Palette) {
    let Some(OverlayState::NewPost(form)) = state.overlay() else {
        return;
    };
    let area = centered_rect(70, 70, frame.size());
    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(form_lines(form, palette))
        .block(
            Block::default()
                .title("New Post")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent))
                .style(palette.base),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn form_lines(form: &PostForm, palette: &Palette) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for field in [
        FormField::Title,
        FormField::Date,
        FormField::Categories,
        FormField::Content,
    ] {
        let focused = form.focus == field;
        let label_style = if focused {
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.muted)
        };
        let hint = match field {
            FormField::Date => " (YYYY-MM-DD)",
            FormField::Categories => " (comma separated)",
            _ => "",
        };
        lines.push(Line::from(vec![
            Span::styled(field.label(), label_style),
            Span::styled(hint, Style::default().fg(palette.muted)),
        ]));
        let value = form.field_value(field).unwrap_or_default();
        let mut rows: Vec<String> = value.split('\n').map(str::to_string).collect();
        if focused {
            if let Some(last) = rows.last_mut() {
                last.push('▌');
            }
        }
        for row in rows {
            lines.push(Line::from(format!("  {row}")));
        }
        lines.push(Line::from(""));
    }

    let button = |field: FormField| {
        let style = if form.focus == field {
            palette.selection.add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Span::styled(format!("[ {} ]", field.label()), style)
    };
    lines.push(Line::from(vec![
        button(FormField::Save),
        Span::raw("  "),
        button(FormField::Cancel),
    ]));

    if let Some(err) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            err.to_string(),
            Style::default()
                .fg(palette.error)
                .add_modifier(Modifier::BOLD),
        )));
    }
    lines
}

fn highlight_line(
    text: &str,
    matcher: Option<&Regex>,
    highlight_style: Style,
    base_style: Style,
) -> Vec<Span<'static>> {
    segments(text, matcher)
        .into_iter()
        .filter(|segment| !segment.text.is_empty())
        .map(|segment| {
            let style = if segment.matched {
                highlight_style
            } else {
                base_style
            };
            Span::styled(segment.text.to_string(), style)
        })
        .collect()
}

fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageHandle;
    use crate::config::AppConfig;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn span_texts(spans: &[Span<'static>]) -> Vec<String> {
        spans
            .iter()
            .map(|span| span.content.clone().into_owned())
            .collect()
    }

    fn screen_text(state: &AppState) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).expect("terminal");
        let mut list_state = ListState::default();
        terminal
            .draw(|frame| draw_app(frame, state, &mut list_state))
            .expect("draw");
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn highlight_splits_title_around_matches() {
        let regex = search_regex("css").expect("regex");
        let spans = highlight_line("Styling with CSS", Some(&regex), Style::default(), Style::default());
        assert_eq!(span_texts(&spans), vec!["Styling with ", "CSS"]);
    }

    #[test]
    fn truncation_respects_display_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");
        assert_eq!(truncate_to_width("日本語テキスト", 5), "日本…");
    }

    #[test]
    fn list_screen_shows_posts_and_page_label() {
        let storage = StorageHandle::in_memory();
        let state = AppState::load(&storage, &AppConfig::default()).expect("state");
        let screen = screen_text(&state);
        assert!(screen.contains("Styling with CSS"));
        assert!(screen.contains("June 23, 2024"));
        assert!(screen.contains("Page 1 of 1"));
    }

    #[test]
    fn empty_filter_shows_empty_state() {
        let storage = StorageHandle::in_memory();
        let mut state = AppState::load(&storage, &AppConfig::default()).expect("state");
        state.set_search_text("no such post anywhere".into());
        assert!(screen_text(&state).contains(EMPTY_MESSAGE));
    }

    #[test]
    fn dialog_lists_fields_and_buttons() {
        let storage = StorageHandle::in_memory();
        let mut state = AppState::load(&storage, &AppConfig::default()).expect("state");
        state.open_new_post();
        let screen = screen_text(&state);
        assert!(screen.contains("New Post"));
        assert!(screen.contains("[ Save ]"));
        assert!(screen.contains("[ Cancel ]"));
    }
}
