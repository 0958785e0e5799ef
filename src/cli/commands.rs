use std::fmt::Write as _;
use std::io::{self, Read};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use crate::app::form::validate_fields;
use crate::app::{ActionDispatcher, App, Pagination};
use crate::config::AppConfig;
use crate::render::list::EMPTY_MESSAGE;
use crate::render::{render_detail_html, render_list_html, ListPage, PostDetail};
use crate::search::{self, CategoryFilter, FilterCriteria, SortOrder};
use crate::storage::{LoadOutcome, PostRecord, PostStore, StorageHandle};
use crate::theme::{self, DisplayMode};

#[derive(Args, Debug, Clone)]
pub struct NewArgs {
    /// Post title (at least 3 characters)
    #[arg()]
    pub title: String,
    /// Publication date as YYYY-MM-DD
    #[arg(long)]
    pub date: Option<String>,
    /// Comma-separated categories
    #[arg(long, default_value = "")]
    pub categories: String,
    /// Post content as HTML. If omitted, reads from stdin.
    #[arg(long)]
    pub content: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Case-insensitive text to look for in titles and content
    #[arg(long, default_value = "")]
    pub search: String,
    /// Only show posts in this category ("all" for every category)
    #[arg(long, default_value = "all")]
    pub category: String,
    /// Date order: asc or desc (defaults to the configured order)
    #[arg(long)]
    pub sort: Option<SortOrder>,
    /// Page to print, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: usize,
    /// Emit the HTML fragment instead of plain text
    #[arg(long)]
    pub html: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Post identifier
    pub id: i64,
    /// Emit the HTML fragment instead of plain text
    #[arg(long)]
    pub html: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeAction {
    Show,
    Toggle,
}

#[derive(Args, Debug, Clone)]
pub struct ThemeArgs {
    #[arg(value_enum, default_value_t = ThemeAction::Show)]
    pub action: ThemeAction,
}

pub fn run_tui(app: &mut App) -> Result<()> {
    app.run()
}

pub fn new_post(storage: &StorageHandle, args: NewArgs) -> Result<()> {
    let content = match &args.content {
        Some(content) => content.clone(),
        None => read_stdin()?.unwrap_or_default(),
    };
    let record = publish(storage, &args, &content)?;
    println!("Created post #{} \"{}\"", record.id, record.title);
    Ok(())
}

fn publish(storage: &StorageHandle, args: &NewArgs, content: &str) -> Result<PostRecord> {
    let draft = validate_fields(
        &args.title,
        args.date.as_deref().unwrap_or_default(),
        &args.categories,
        content,
    )?;
    let mut store = load_store(storage)?;
    ActionDispatcher::new(storage)
        .create_post(&mut store, draft)
        .context("creating post")
}

pub fn list_posts(config: &AppConfig, storage: &StorageHandle, args: ListArgs) -> Result<()> {
    print!("{}", run_list(config, storage, &args)?);
    Ok(())
}

fn run_list(config: &AppConfig, storage: &StorageHandle, args: &ListArgs) -> Result<String> {
    let store = load_store(storage)?;
    let criteria = FilterCriteria::new(
        args.search.clone(),
        CategoryFilter::from_input(&args.category),
        args.sort.unwrap_or(config.default_sort),
    );
    let filtered = search::apply(store.posts(), &criteria);
    let mut pagination = Pagination::default();
    pagination.reset(filtered.len());
    if !pagination.change_page(args.page) && args.page != 1 {
        tracing::debug!(page = args.page, "requested page out of range, showing page 1");
    }
    let page = ListPage::build(&filtered, &pagination);

    if args.html {
        let mut html = render_list_html(&page);
        html.push('\n');
        return Ok(html);
    }
    Ok(format_list(&page))
}

fn format_list(page: &ListPage) -> String {
    let mut out = String::new();
    if page.is_empty() {
        let _ = writeln!(&mut out, "{EMPTY_MESSAGE}");
    }
    for summary in &page.summaries {
        let _ = writeln!(&mut out, "#{}  {}", summary.id, summary.title);
        let _ = writeln!(&mut out, "    {}", summary.date_label);
        if !summary.excerpt.is_empty() {
            let _ = writeln!(&mut out, "    {}", summary.excerpt);
        }
        out.push('\n');
    }
    let _ = writeln!(&mut out, "{}", page.page_label);
    out
}

pub fn show_post(storage: &StorageHandle, args: ShowArgs) -> Result<()> {
    print!("{}", run_show(storage, &args)?);
    Ok(())
}

fn run_show(storage: &StorageHandle, args: &ShowArgs) -> Result<String> {
    let store = load_store(storage)?;
    let Some(detail) = PostDetail::find(store.posts(), args.id) else {
        tracing::debug!(id = args.id, "no post with that id");
        return Ok(String::new());
    };
    if args.html {
        return Ok(format!("{}\n", render_detail_html(&detail)));
    }

    let mut out = String::new();
    let _ = writeln!(&mut out, "{}", detail.title);
    let _ = writeln!(&mut out, "{}", detail.date_label);
    out.push('\n');
    for line in &detail.lines {
        let _ = writeln!(&mut out, "{line}");
    }
    if !detail.categories.is_empty() {
        out.push('\n');
        let tags: Vec<_> = detail.categories.iter().map(|c| format!("[{c}]")).collect();
        let _ = writeln!(&mut out, "{}", tags.join(" "));
    }
    Ok(out)
}

pub fn list_categories(storage: &StorageHandle) -> Result<()> {
    let store = load_store(storage)?;
    for category in store.categories() {
        println!("{category}");
    }
    Ok(())
}

pub fn theme(storage: &StorageHandle, args: ThemeArgs) -> Result<()> {
    let mode = run_theme(storage, args.action)?;
    println!("{mode}");
    Ok(())
}

fn run_theme(storage: &StorageHandle, action: ThemeAction) -> Result<DisplayMode> {
    let current = theme::load(storage)?;
    match action {
        ThemeAction::Show => Ok(current),
        ThemeAction::Toggle => ActionDispatcher::new(storage).toggle_display_mode(current),
    }
}

pub fn reset(storage: &StorageHandle) -> Result<()> {
    ActionDispatcher::new(storage).reset_posts()?;
    println!("Cleared all posts");
    Ok(())
}

fn load_store(storage: &StorageHandle) -> Result<PostStore> {
    let (store, outcome) = PostStore::load(storage)?;
    if let LoadOutcome::Recovered { backup_key, reason } = outcome {
        eprintln!("warning: saved posts were unreadable ({reason}); raw copy kept as '{backup_key}'");
    }
    Ok(store)
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("reading post content from stdin")?;
    Ok(Some(buf))
}
