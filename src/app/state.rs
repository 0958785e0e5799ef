use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use super::actions::ActionDispatcher;
use super::debounce::SearchDebouncer;
use super::form::{FormError, PostForm};
use super::pagination::Pagination;
use crate::config::AppConfig;
use crate::render::{ListPage, PostDetail};
use crate::search::{self, CategoryFilter, FilterCriteria, SortOrder};
use crate::storage::{LoadOutcome, PostRecord, PostStore, StorageHandle};
use crate::theme::{self, DisplayMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    List,
    Detail { id: i64, scroll: u16 },
}

#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub active: bool,
    pub input: String,
}

#[derive(Debug, Clone)]
pub enum OverlayState {
    NewPost(PostForm),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(i64),
    Rejected(FormError),
    NoForm,
}

#[derive(Debug)]
pub struct AppState {
    store: PostStore,
    criteria: FilterCriteria,
    filtered: Vec<PostRecord>,
    categories: Vec<String>,
    pagination: Pagination,
    view: View,
    cursor: usize,
    overlay: Option<OverlayState>,
    display_mode: DisplayMode,
    status_message: Option<String>,
    search: SearchState,
    debouncer: SearchDebouncer,
}

impl AppState {
    pub fn load(storage: &StorageHandle, config: &AppConfig) -> Result<Self> {
        let (store, outcome) = PostStore::load(storage).context("loading posts")?;
        let display_mode = theme::load(storage)?;
        let debouncer = SearchDebouncer::new(config.search.debounce_duration());
        let mut state = Self::new(store, display_mode, config.default_sort, debouncer);
        if let LoadOutcome::Recovered { backup_key, .. } = outcome {
            state.set_status_message(Some(format!(
                "Saved posts were unreadable; kept a copy under '{backup_key}' and started empty"
            )));
        }
        Ok(state)
    }

    pub fn new(
        store: PostStore,
        display_mode: DisplayMode,
        sort: SortOrder,
        debouncer: SearchDebouncer,
    ) -> Self {
        let mut state = Self {
            store,
            criteria: FilterCriteria::new("", CategoryFilter::All, sort),
            filtered: Vec::new(),
            categories: Vec::new(),
            pagination: Pagination::default(),
            view: View::List,
            cursor: 0,
            overlay: None,
            display_mode,
            status_message: None,
            search: SearchState::default(),
            debouncer,
        };
        state.refresh_categories();
        state.apply_filters();
        state
    }

    pub fn store(&self) -> &PostStore {
        &self.store
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn filtered(&self) -> &[PostRecord] {
        &self.filtered
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn is_search_active(&self) -> bool {
        self.search.active
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn set_status_message<S: Into<String>>(&mut self, message: Option<S>) {
        self.status_message = message.map(Into::into);
    }

    pub fn clear_status_message(&mut self) {
        self.status_message = None;
    }

    pub fn current_page(&self) -> ListPage {
        ListPage::build(&self.filtered, &self.pagination)
    }

    pub fn current_detail(&self) -> Option<PostDetail> {
        match self.view {
            View::Detail { id, .. } => PostDetail::find(self.store.posts(), id),
            View::List => None,
        }
    }

    pub fn selected_post_id(&self) -> Option<i64> {
        self.pagination
            .slice(&self.filtered)
            .get(self.cursor)
            .map(|post| post.id)
    }

    pub fn apply_filters(&mut self) {
        self.filtered = search::apply(self.store.posts(), &self.criteria);
        self.pagination.reset(self.filtered.len());
        self.cursor = 0;
    }

    pub fn refresh_categories(&mut self) {
        self.categories = self.store.categories();
    }

    pub fn move_cursor(&mut self, delta: isize) {
        match &mut self.view {
            View::List => {
                let len = self.pagination.slice(&self.filtered).len();
                if len == 0 {
                    self.cursor = 0;
                    return;
                }
                let max = len as isize - 1;
                self.cursor = (self.cursor as isize + delta).clamp(0, max) as usize;
            }
            View::Detail { scroll, .. } => {
                let next = i64::from(*scroll) + delta as i64;
                *scroll = next.clamp(0, i64::from(u16::MAX)) as u16;
            }
        }
    }

    pub fn change_page(&mut self, page: usize) -> bool {
        let changed = self.pagination.change_page(page);
        if changed {
            self.cursor = 0;
        }
        changed
    }

    pub fn next_page(&mut self) -> bool {
        self.change_page(self.pagination.page() + 1)
    }

    pub fn previous_page(&mut self) -> bool {
        match self.pagination.page().checked_sub(1) {
            Some(page) => self.change_page(page),
            None => false,
        }
    }

    pub fn scroll_to_top(&mut self) {
        match &mut self.view {
            View::List => self.cursor = 0,
            View::Detail { scroll, .. } => *scroll = 0,
        }
    }

    pub fn open_detail(&mut self, id: i64) -> bool {
        if self.store.find(id).is_none() {
            tracing::debug!(id, "detail requested for unknown post");
            return false;
        }
        self.view = View::Detail { id, scroll: 0 };
        true
    }

    pub fn open_selected(&mut self) -> bool {
        match self.selected_post_id() {
            Some(id) => self.open_detail(id),
            None => false,
        }
    }

    pub fn back_to_list(&mut self) {
        self.view = View::List;
    }

    pub fn begin_search(&mut self) {
        self.search.active = true;
        self.search.input = self.criteria.search.clone();
    }

    pub fn push_search_char(&mut self, ch: char, now: Instant) {
        self.search.input.push(ch);
        self.debouncer.schedule(self.search.input.clone(), now);
    }

    pub fn pop_search_char(&mut self, now: Instant) {
        self.search.input.pop();
        self.debouncer.schedule(self.search.input.clone(), now);
    }

    pub fn finish_search(&mut self) {
        self.debouncer.cancel();
        self.search.active = false;
        let input = self.search.input.clone();
        self.set_search_text(input);
    }

    pub fn leave_search(&mut self) {
        self.search.active = false;
        if let Some(text) = self.debouncer.flush_now() {
            self.set_search_text(text);
        }
    }

    pub fn search_wait(&self, now: Instant) -> Option<Duration> {
        self.debouncer.remaining(now)
    }

    pub fn poll_search(&mut self, now: Instant) -> bool {
        match self.debouncer.poll(now) {
            Some(text) => {
                self.set_search_text(text);
                true
            }
            None => false,
        }
    }

    pub fn set_search_text(&mut self, text: String) {
        if self.criteria.search == text {
            return;
        }
        self.criteria.search = text;
        self.apply_filters();
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.criteria.category = category;
        self.apply_filters();
    }

    pub fn cycle_category(&mut self, forward: bool) {
        let total = self.categories.len() + 1;
        let current = match &self.criteria.category {
            CategoryFilter::All => 0,
            CategoryFilter::Named(name) => self
                .categories
                .iter()
                .position(|candidate| candidate.eq_ignore_ascii_case(name))
                .map(|index| index + 1)
                .unwrap_or(0),
        };
        let next = if forward {
            (current + 1) % total
        } else {
            (current + total - 1) % total
        };
        let category = match next {
            0 => CategoryFilter::All,
            index => CategoryFilter::Named(self.categories[index - 1].clone()),
        };
        self.set_category(category);
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.criteria.sort = sort;
        self.apply_filters();
    }

    pub fn toggle_sort(&mut self) {
        self.set_sort(self.criteria.sort.toggled());
    }

    pub fn toggle_display_mode(&mut self, storage: &StorageHandle) -> Result<()> {
        self.display_mode = ActionDispatcher::new(storage).toggle_display_mode(self.display_mode)?;
        Ok(())
    }

    pub fn overlay(&self) -> Option<&OverlayState> {
        self.overlay.as_ref()
    }

    pub fn open_new_post(&mut self) {
        self.overlay = Some(OverlayState::NewPost(PostForm::new()));
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn cancel_new_post(&mut self) {
        if self.overlay.take().is_some() {
            self.back_to_list();
            self.set_status_message(Some("Canceled new post"));
        }
    }

    pub fn new_post_form(&self) -> Option<&PostForm> {
        match &self.overlay {
            Some(OverlayState::NewPost(form)) => Some(form),
            None => None,
        }
    }

    pub fn new_post_form_mut(&mut self) -> Option<&mut PostForm> {
        match &mut self.overlay {
            Some(OverlayState::NewPost(form)) => Some(form),
            None => None,
        }
    }

    pub fn submit_new_post(&mut self, storage: &StorageHandle) -> Result<SubmitOutcome> {
        let Some(form) = self.new_post_form_mut() else {
            return Ok(SubmitOutcome::NoForm);
        };
        let draft = match form.submit() {
            Ok(draft) => draft,
            Err(err) => {
                self.set_status_message(Some(err.to_string()));
                return Ok(SubmitOutcome::Rejected(err));
            }
        };

        let record = ActionDispatcher::new(storage).create_post(&mut self.store, draft)?;
        self.refresh_categories();
        self.apply_filters();
        self.close_overlay();
        self.open_detail(record.id);
        self.set_status_message(Some(format!("Published \"{}\"", record.title)));
        Ok(SubmitOutcome::Created(record.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::form::FormField;
    use assert_matches::assert_matches;
    use time::macros::date;

    fn seeded(storage: &StorageHandle) -> AppState {
        AppState::load(storage, &AppConfig::default()).expect("state loads")
    }

    fn many_posts(count: i64) -> PostStore {
        PostStore::from_posts(
            (1..=count)
                .map(|id| PostRecord {
                    id,
                    title: format!("Post {id}"),
                    date: date!(2024 - 01 - 01) + time::Duration::days(id),
                    content: "<p>Filler content body</p>".into(),
                    categories: vec![if id % 2 == 0 { "Even" } else { "Odd" }.into()],
                })
                .collect(),
        )
    }

    fn state_with(store: PostStore) -> AppState {
        AppState::new(
            store,
            DisplayMode::Light,
            SortOrder::Descending,
            SearchDebouncer::new(Duration::from_millis(250)),
        )
    }

    #[test]
    fn loads_seeded_posts_newest_first() {
        let storage = StorageHandle::in_memory();
        let state = seeded(&storage);
        let titles: Vec<_> = state.filtered().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Styling with CSS", "Exploring JavaScript", "Welcome to Vivid Blog"]
        );
        assert_eq!(state.pagination().label(), "Page 1 of 1");
        assert_eq!(state.categories().len(), 6);
    }

    #[test]
    fn criteria_changes_reset_to_first_page() {
        let mut state = state_with(many_posts(12));
        assert!(state.next_page());
        assert!(state.next_page());
        assert!(!state.next_page());
        assert_eq!(state.pagination().page(), 3);

        state.toggle_sort();
        assert_eq!(state.pagination().page(), 1);
        assert_eq!(state.filtered()[0].id, 1);

        state.change_page(2);
        state.cycle_category(true);
        assert_eq!(state.criteria().category, CategoryFilter::Named("Even".into()));
        assert_eq!(state.pagination().page(), 1);
        assert_eq!(state.filtered().len(), 6);
    }

    #[test]
    fn category_cycle_wraps_back_to_all() {
        let mut state = state_with(many_posts(3));
        state.cycle_category(false);
        assert_eq!(state.criteria().category, CategoryFilter::Named("Odd".into()));
        state.cycle_category(true);
        assert_eq!(state.criteria().category, CategoryFilter::All);
    }

    #[test]
    fn search_waits_for_the_idle_window() {
        let storage = StorageHandle::in_memory();
        let mut state = seeded(&storage);
        let start = Instant::now();
        state.begin_search();
        for (offset, ch) in "css".chars().enumerate() {
            state.push_search_char(ch, start + Duration::from_millis(offset as u64 * 50));
        }
        assert!(!state.poll_search(start + Duration::from_millis(200)));
        assert_eq!(state.filtered().len(), 3);

        let last_key = start + Duration::from_millis(100);
        assert_eq!(
            state.search_wait(start + Duration::from_millis(200)),
            Some(Duration::from_millis(150))
        );
        assert!(state.poll_search(last_key + Duration::from_millis(250)));
        assert_eq!(state.search_wait(last_key), None);
        assert_eq!(state.filtered().len(), 1);
        assert_eq!(state.filtered()[0].title, "Styling with CSS");
    }

    #[test]
    fn enter_applies_search_immediately() {
        let storage = StorageHandle::in_memory();
        let mut state = seeded(&storage);
        state.begin_search();
        for ch in "welcome".chars() {
            state.push_search_char(ch, Instant::now());
        }
        state.finish_search();
        assert!(!state.is_search_active());
        assert_eq!(state.filtered().len(), 1);
        assert!(!state.poll_search(Instant::now() + Duration::from_secs(1)));
    }

    #[test]
    fn escape_applies_pending_search_text() {
        let storage = StorageHandle::in_memory();
        let mut state = seeded(&storage);
        let now = Instant::now();
        state.begin_search();
        for ch in "javascript".chars() {
            state.push_search_char(ch, now);
        }
        state.leave_search();
        assert!(!state.is_search_active());
        assert_eq!(state.criteria().search, "javascript");
        assert_eq!(state.search_wait(now), None);
        assert_eq!(state.filtered()[0].title, "Exploring JavaScript");
    }

    #[test]
    fn unknown_detail_id_is_a_silent_no_op() {
        let storage = StorageHandle::in_memory();
        let mut state = seeded(&storage);
        assert!(!state.open_detail(42));
        assert_eq!(state.view(), View::List);
        assert!(state.open_selected());
        assert_matches!(state.view(), View::Detail { id: 3, scroll: 0 });
        state.move_cursor(3);
        assert_matches!(state.view(), View::Detail { scroll: 3, .. });
        state.scroll_to_top();
        assert_matches!(state.view(), View::Detail { scroll: 0, .. });
        state.back_to_list();
        assert_eq!(state.view(), View::List);
    }

    #[test]
    fn rejected_submit_keeps_dialog_open() -> anyhow::Result<()> {
        let storage = StorageHandle::in_memory();
        let mut state = seeded(&storage);
        state.open_new_post();
        if let Some(form) = state.new_post_form_mut() {
            form.title = "Hi".into();
            form.date = "2024-01-01".into();
            form.content = "short".into();
            form.focus = FormField::Content;
        }
        let outcome = state.submit_new_post(&storage)?;
        assert_eq!(outcome, SubmitOutcome::Rejected(FormError::TitleTooShort));
        assert_eq!(state.new_post_form().map(|f| f.focus), Some(FormField::Title));
        assert_eq!(
            state.status_message(),
            Some("Title should be at least 3 characters.")
        );
        assert_eq!(state.store().len(), 3);
        Ok(())
    }

    #[test]
    fn successful_submit_creates_and_opens_detail() -> anyhow::Result<()> {
        let storage = StorageHandle::in_memory();
        let mut state = seeded(&storage);
        state.set_category(CategoryFilter::Named("CSS".into()));
        state.open_new_post();
        if let Some(form) = state.new_post_form_mut() {
            form.title = "Terminal blogging".into();
            form.date = "2024-07-04".into();
            form.categories = "Rust, CLI".into();
            form.content = "<p>Writing posts from a terminal.</p>".into();
        }
        let outcome = state.submit_new_post(&storage)?;
        assert_eq!(outcome, SubmitOutcome::Created(4));
        assert!(state.overlay().is_none());
        assert_eq!(state.view(), View::Detail { id: 4, scroll: 0 });
        assert!(state.categories().iter().any(|c| c == "Rust"));
        assert_eq!(state.store().posts()[0].id, 4);

        let (reloaded, _) = PostStore::load(&storage)?;
        assert_eq!(reloaded.len(), 4);
        Ok(())
    }

    #[test]
    fn cancel_reports_and_returns_to_list() {
        let storage = StorageHandle::in_memory();
        let mut state = seeded(&storage);
        state.open_new_post();
        state.cancel_new_post();
        assert!(state.overlay().is_none());
        assert_eq!(state.status_message(), Some("Canceled new post"));
    }

    #[test]
    fn display_mode_toggle_persists() -> anyhow::Result<()> {
        let storage = StorageHandle::in_memory();
        let mut state = seeded(&storage);
        assert_eq!(state.display_mode(), DisplayMode::Light);
        state.toggle_display_mode(&storage)?;
        assert_eq!(seeded(&storage).display_mode(), DisplayMode::Dark);
        Ok(())
    }

    #[test]
    fn cursor_stays_within_the_page() {
        let mut state = state_with(many_posts(7));
        state.move_cursor(10);
        assert_eq!(state.cursor(), 4);
        state.next_page();
        assert_eq!(state.cursor(), 0);
        state.move_cursor(10);
        assert_eq!(state.cursor(), 1);
        state.move_cursor(-5);
        assert_eq!(state.selected_post_id(), Some(2));
    }
}
