use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;
use ratatui::Terminal;

use crate::config::AppConfig;
use crate::storage::StorageHandle;
use crate::ui;

pub mod actions;
pub mod debounce;
pub mod form;
pub mod pagination;
pub mod state;

pub use actions::ActionDispatcher;
pub use form::{FormError, FormField, PostForm};
pub use pagination::{Pagination, PAGE_SIZE};
pub use state::{AppState, OverlayState, SearchState, SubmitOutcome, View};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Quit,
    CursorDown,
    CursorUp,
    OpenDetail,
    BackToList,
    PreviousPage,
    NextPage,
    StartSearch,
    NextCategory,
    PreviousCategory,
    ToggleSort,
    NewPost,
    ToggleDisplayMode,
    ScrollToTop,
}

pub struct App {
    pub config: Arc<AppConfig>,
    pub storage: StorageHandle,
    state: AppState,
    list_state: ListState,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(config: Arc<AppConfig>, storage: StorageHandle) -> Result<Self> {
        let state = AppState::load(&storage, &config).context("loading initial state")?;
        Ok(Self {
            config,
            storage,
            state,
            list_state: ListState::default(),
            should_quit: false,
            tick_rate: Duration::from_millis(250),
        })
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            terminal
                .draw(|frame| {
                    if self.state.current_page().is_empty() {
                        self.list_state.select(None);
                    } else {
                        self.list_state.select(Some(self.state.cursor()));
                    }
                    ui::draw_app(frame, &self.state, &mut self.list_state);
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = poll_timeout(
                self.tick_rate.saturating_sub(last_tick.elapsed()),
                self.state.search_wait(Instant::now()),
            );

            if event::poll(timeout).context("polling for terminal events")? {
                if let Event::Key(key) = event::read().context("reading terminal event")? {
                    self.handle_key(key);
                }
            }

            self.poll_search();
            if last_tick.elapsed() >= self.tick_rate {
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    fn poll_search(&mut self) {
        if self.state.poll_search(Instant::now()) {
            tracing::debug!(search = %self.state.criteria().search, "applied debounced search");
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.handle_overlay_key(key) {
            return;
        }

        if self.state.is_search_active() {
            self.handle_search_key(key);
            return;
        }

        if let Some(action) = map_key(key) {
            self.handle_action(action);
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.state.finish_search(),
            KeyCode::Esc => self.state.leave_search(),
            KeyCode::Backspace => self.state.pop_search_char(Instant::now()),
            KeyCode::Char(ch) if is_plain(&key) => {
                self.state.push_search_char(ch, Instant::now())
            }
            _ => {}
        }
    }

    fn handle_action(&mut self, action: Action) {
        self.state.clear_status_message();
        match action {
            Action::Quit => self.should_quit = true,
            Action::CursorDown => self.state.move_cursor(1),
            Action::CursorUp => self.state.move_cursor(-1),
            Action::OpenDetail => {
                if matches!(self.state.view(), View::List) {
                    self.state.open_selected();
                }
            }
            Action::BackToList => self.state.back_to_list(),
            Action::PreviousPage => {
                if matches!(self.state.view(), View::List) {
                    self.state.previous_page();
                }
            }
            Action::NextPage => {
                if matches!(self.state.view(), View::List) {
                    self.state.next_page();
                }
            }
            Action::StartSearch => {
                self.state.back_to_list();
                self.state.begin_search();
            }
            Action::NextCategory => self.state.cycle_category(true),
            Action::PreviousCategory => self.state.cycle_category(false),
            Action::ToggleSort => self.state.toggle_sort(),
            Action::NewPost => {
                if self.state.overlay().is_none() {
                    self.state.open_new_post();
                    self.state.set_status_message(Some(
                        "Tab moves between fields • Ctrl-s saves • Esc cancels",
                    ));
                }
            }
            Action::ToggleDisplayMode => {
                if let Err(err) = self.state.toggle_display_mode(&self.storage) {
                    tracing::error!(?err, "failed to toggle display mode");
                    self.state
                        .set_status_message(Some("Failed to save display mode"));
                }
            }
            Action::ScrollToTop => self.state.scroll_to_top(),
        }
    }

    fn handle_overlay_key(&mut self, key: KeyEvent) -> bool {
        let Some(form) = self.state.new_post_form_mut() else {
            return false;
        };
        let focus = form.focus;
        match key.code {
            KeyCode::Esc => self.state.cancel_new_post(),
            KeyCode::Tab => form.focus_next(),
            KeyCode::BackTab => form.focus_previous(),
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.submit_new_post()
            }
            KeyCode::Enter => match focus {
                FormField::Cancel => self.state.cancel_new_post(),
                FormField::Content => form.push_char('\n'),
                _ => self.submit_new_post(),
            },
            KeyCode::Backspace => form.pop_char(),
            KeyCode::Char(ch) if is_plain(&key) => form.push_char(ch),
            _ => {}
        }
        true
    }

    fn submit_new_post(&mut self) {
        match self.state.submit_new_post(&self.storage) {
            Ok(SubmitOutcome::Created(id)) => tracing::info!(id, "post published from dialog"),
            Ok(SubmitOutcome::Rejected(err)) => tracing::debug!(%err, "new post rejected"),
            Ok(SubmitOutcome::NoForm) => {}
            Err(err) => {
                tracing::error!(?err, "failed to save new post");
                self.state
                    .set_status_message(Some(format!("Failed to save post: {err}")));
            }
        }
    }
}

fn poll_timeout(until_tick: Duration, search_wait: Option<Duration>) -> Duration {
    search_wait.map_or(until_tick, |wait| wait.min(until_tick))
}

fn is_plain(key: &KeyEvent) -> bool {
    !key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
}

fn map_key(key: KeyEvent) -> Option<Action> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }
    if !is_plain(&key) {
        return None;
    }
    let action = match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('j') | KeyCode::Down => Action::CursorDown,
        KeyCode::Char('k') | KeyCode::Up => Action::CursorUp,
        KeyCode::Enter => Action::OpenDetail,
        KeyCode::Esc | KeyCode::Backspace => Action::BackToList,
        KeyCode::Char('h') | KeyCode::Left => Action::PreviousPage,
        KeyCode::Char('l') | KeyCode::Right => Action::NextPage,
        KeyCode::Char('/') => Action::StartSearch,
        KeyCode::Char('c') => Action::NextCategory,
        KeyCode::Char('C') => Action::PreviousCategory,
        KeyCode::Char('s') => Action::ToggleSort,
        KeyCode::Char('a') => Action::NewPost,
        KeyCode::Char('m') => Action::ToggleDisplayMode,
        KeyCode::Char('g') | KeyCode::Home => Action::ScrollToTop,
        _ => return None,
    };
    Some(action)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("restoring screen state")?;
    Ok(())
}
