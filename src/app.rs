use std::collections::HashSet;

use chrono::NaiveDate;
use regex::Regex;
use tokio::sync::{broadcast, mpsc};

use crate::api::NasaClient;
use crate::config::Config;
use crate::data::{ApodStore, Page};
use crate::db::Repository;
use crate::error::{ErrorView, Result};
use crate::models::{Apod, FavoriteApod};
use crate::net::NetworkMonitor;
use crate::theme::ThemeMode;
use crate::tui::AppAction;

pub type Store = ApodStore<NasaClient, NetworkMonitor>;

/// Prefetch the next page when the selection gets this close to the end.
const PREFETCH_DISTANCE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    List,
    Detail,
    Favorites,
    Settings,
}

// Message for a completed background page load
pub struct PageResult {
    pub generation: u64,
    pub page: usize,
    pub result: std::result::Result<Page, String>,
}

// Message for a completed background by-date lookup
pub struct DetailResult {
    pub generation: u64,
    pub result: std::result::Result<Apod, String>,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

pub struct App {
    // Data
    pub items: Vec<Apod>,
    pub favorites: Vec<FavoriteApod>,
    pub favorite_dates: HashSet<NaiveDate>,
    pub stats: (i64, i64),

    // UI state
    pub screen: Screen,
    pub selected_index: usize,
    pub favorites_index: usize,
    pub detail: Option<Apod>,
    pub detail_is_favorite: bool,
    pub detail_scroll: u16,
    detail_return: Screen,
    pub theme: ThemeMode,
    pub show_help: bool,
    pub date_input_active: bool,
    pub date_input: String,
    pub date_input_error: Option<String>,
    pub settings_status: Option<StatusMessage>,

    // Load state
    pub is_loading: bool,
    pub is_retrying: bool,
    pub detail_loading: bool,
    pub error: Option<ErrorView>,
    next_page: Option<usize>,
    generation: u64,

    // Async plumbing
    page_rx: mpsc::Receiver<PageResult>,
    page_tx: mpsc::Sender<PageResult>,
    detail_rx: mpsc::Receiver<DetailResult>,
    detail_tx: mpsc::Sender<DetailResult>,
    cache_cleared_rx: broadcast::Receiver<()>,

    // Services
    pub store: Store,
    config: Config,
    date_re: Regex,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        let repository = Repository::new(&config.db_path).await?;
        let remote = NasaClient::new(config.api_key.clone());
        let monitor = NetworkMonitor::new(config.probe_url.clone());
        let store = ApodStore::new(
            remote,
            monitor,
            repository,
            config.page_size,
            config.cache_max_age_days,
        );

        if let Err(e) = store.sweep_old_cache().await {
            tracing::warn!("Cache sweep failed: {e}");
        }

        let favorites = store.favorites().await?;
        let favorite_dates = favorites.iter().map(|f| f.apod.date).collect();
        let stats = store.stats().await?;

        let (page_tx, page_rx) = mpsc::channel(4);
        let (detail_tx, detail_rx) = mpsc::channel(1);
        let cache_cleared_rx = store.subscribe_cache_cleared();

        Ok(Self {
            items: Vec::new(),
            favorites,
            favorite_dates,
            stats,
            screen: Screen::List,
            selected_index: 0,
            favorites_index: 0,
            detail: None,
            detail_is_favorite: false,
            detail_scroll: 0,
            detail_return: Screen::List,
            theme: config.theme,
            show_help: false,
            date_input_active: false,
            date_input: String::new(),
            date_input_error: None,
            settings_status: None,
            is_loading: false,
            is_retrying: false,
            detail_loading: false,
            error: None,
            next_page: Some(0),
            generation: 0,
            page_rx,
            page_tx,
            detail_rx,
            detail_tx,
            cache_cleared_rx,
            store,
            config: config.clone(),
            date_re: Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"),
        })
    }

    /// Kick off the first page load once the UI is up.
    pub fn start_initial_load(&mut self) {
        self.request_next_page();
    }

    /// Headless cache warm-up for `--refresh`.
    pub async fn warm_cache(&self) -> Result<usize> {
        let page = self.store.load_page(0).await?;
        Ok(page.items.len())
    }

    /// True when the error replaces the whole list (nothing loaded yet).
    pub fn error_screen_active(&self) -> bool {
        self.error.is_some() && self.items.is_empty() && self.screen == Screen::List
    }

    pub fn selected_apod(&self) -> Option<&Apod> {
        match self.screen {
            Screen::List => self.items.get(self.selected_index),
            Screen::Favorites => self.favorites.get(self.favorites_index).map(|f| &f.apod),
            Screen::Detail => self.detail.as_ref(),
            Screen::Settings => None,
        }
    }

    pub async fn handle_action(&mut self, action: AppAction) -> Result<bool> {
        match action {
            AppAction::Quit => return Ok(true),

            AppAction::MoveUp => match self.screen {
                Screen::List => {
                    self.selected_index = self.selected_index.saturating_sub(1);
                }
                Screen::Favorites => {
                    self.favorites_index = self.favorites_index.saturating_sub(1);
                }
                Screen::Detail => {
                    self.detail_scroll = self.detail_scroll.saturating_sub(1);
                }
                Screen::Settings => {}
            },

            AppAction::MoveDown => match self.screen {
                Screen::List => {
                    if self.selected_index + 1 < self.items.len() {
                        self.selected_index += 1;
                    }
                    self.maybe_prefetch();
                }
                Screen::Favorites => {
                    if self.favorites_index + 1 < self.favorites.len() {
                        self.favorites_index += 1;
                    }
                }
                Screen::Detail => {
                    self.detail_scroll = self.detail_scroll.saturating_add(1);
                }
                Screen::Settings => {}
            },

            AppAction::MoveToTop => match self.screen {
                Screen::List => self.selected_index = 0,
                Screen::Favorites => self.favorites_index = 0,
                Screen::Detail => self.detail_scroll = 0,
                Screen::Settings => {}
            },

            AppAction::MoveToBottom => match self.screen {
                Screen::List => {
                    self.selected_index = self.items.len().saturating_sub(1);
                    self.maybe_prefetch();
                }
                Screen::Favorites => {
                    self.favorites_index = self.favorites.len().saturating_sub(1);
                }
                Screen::Detail | Screen::Settings => {}
            },

            AppAction::Select => match self.screen {
                Screen::List | Screen::Favorites => {
                    if let Some(apod) = self.selected_apod().cloned() {
                        self.open_detail(apod).await?;
                    }
                }
                Screen::Detail | Screen::Settings => {}
            },

            AppAction::Back => {
                if self.screen == Screen::Detail {
                    self.screen = self.detail_return;
                    self.detail = None;
                    self.detail_scroll = 0;
                } else {
                    self.screen = Screen::List;
                }
            }

            AppAction::Refresh => {
                if self.screen == Screen::List {
                    self.refresh();
                }
            }

            AppAction::Retry => {
                self.is_retrying = true;
                if self.items.is_empty() {
                    self.refresh();
                } else {
                    self.request_next_page();
                }
            }

            AppAction::ToggleFavorite => {
                self.toggle_favorite_current().await?;
            }

            AppAction::OpenInBrowser => {
                if let Some(apod) = self.selected_apod() {
                    open_link(&apod.url);
                }
            }

            AppAction::OpenHdInBrowser => {
                if let Some(url) = self.selected_apod().and_then(|a| a.hdurl.clone()) {
                    open_link(&url);
                }
            }

            AppAction::ShowList => {
                self.screen = Screen::List;
            }

            AppAction::ShowFavorites => {
                self.reload_favorites().await?;
                self.favorites_index = 0;
                self.screen = Screen::Favorites;
            }

            AppAction::ShowSettings => {
                self.refresh_stats().await?;
                self.settings_status = None;
                self.screen = Screen::Settings;
            }

            AppAction::CycleTheme => {
                if self.screen == Screen::Settings {
                    self.theme = self.theme.cycle();
                    self.config.theme = self.theme;
                    if let Err(e) = self.config.save() {
                        tracing::warn!("Failed to persist theme choice: {e}");
                    }
                    self.settings_status = Some(StatusMessage {
                        text: format!("Theme: {}", self.theme),
                        is_error: false,
                    });
                }
            }

            AppAction::ClearCache => {
                if self.screen == Screen::Settings {
                    match self.store.clear_cache().await {
                        Ok(()) => {
                            self.settings_status = Some(StatusMessage {
                                text: "Cache and favorites cleared".to_string(),
                                is_error: false,
                            });
                        }
                        Err(e) => {
                            self.settings_status = Some(StatusMessage {
                                text: format!("Failed to clear cache: {e}"),
                                is_error: true,
                            });
                        }
                    }
                }
            }

            AppAction::JumpToDateStart => {
                self.date_input_active = true;
                self.date_input.clear();
                self.date_input_error = None;
            }

            AppAction::DateInputChar(c) => {
                self.date_input.push(c);
            }

            AppAction::DateInputBackspace => {
                self.date_input.pop();
            }

            AppAction::DateInputConfirm => {
                self.confirm_date_input();
            }

            AppAction::DateInputCancel => {
                self.date_input_active = false;
                self.date_input.clear();
                self.date_input_error = None;
            }

            AppAction::ShowHelp => {
                self.show_help = true;
            }

            AppAction::HideHelp => {
                self.show_help = false;
            }
        }

        Ok(false)
    }

    fn maybe_prefetch(&mut self) {
        if self.items.is_empty() {
            return;
        }
        if self.selected_index + PREFETCH_DISTANCE >= self.items.len() {
            self.request_next_page();
        }
    }

    /// Reload from the first page, dropping any in-flight results.
    fn refresh(&mut self) {
        self.generation += 1;
        self.is_loading = false;
        self.next_page = Some(0);
        self.request_next_page();
    }

    fn request_next_page(&mut self) {
        if self.is_loading {
            return;
        }
        let Some(page) = self.next_page else {
            return;
        };

        self.is_loading = true;
        let store = self.store.clone();
        let tx = self.page_tx.clone();
        let generation = self.generation;

        tokio::spawn(async move {
            let result = store.load_page(page).await.map_err(|e| e.to_string());
            let _ = tx.send(PageResult {
                generation,
                page,
                result,
            })
            .await;
        });
    }

    fn confirm_date_input(&mut self) {
        let text = self.date_input.trim().to_string();
        if !self.date_re.is_match(&text) {
            self.date_input_error = Some("Enter a date as YYYY-MM-DD".to_string());
            return;
        }
        let Ok(date) = NaiveDate::parse_from_str(&text, "%Y-%m-%d") else {
            self.date_input_error = Some("Not a valid calendar date".to_string());
            return;
        };

        self.date_input_active = false;
        self.date_input.clear();
        self.date_input_error = None;
        self.detail_loading = true;

        let store = self.store.clone();
        let tx = self.detail_tx.clone();
        let generation = self.generation;

        tokio::spawn(async move {
            let result = store.detail(date).await.map_err(|e| e.to_string());
            let _ = tx.send(DetailResult { generation, result }).await;
        });
    }

    async fn open_detail(&mut self, apod: Apod) -> Result<()> {
        self.detail_is_favorite = self.store.is_favorite(apod.date).await?;
        self.detail = Some(apod);
        self.detail_scroll = 0;
        self.detail_return = self.screen;
        self.screen = Screen::Detail;
        Ok(())
    }

    async fn toggle_favorite_current(&mut self) -> Result<()> {
        let Some(apod) = self.selected_apod().cloned() else {
            return Ok(());
        };

        let is_favorite = self.store.toggle_favorite(&apod).await?;
        if self.detail.as_ref().is_some_and(|d| d.date == apod.date) {
            self.detail_is_favorite = is_favorite;
        }
        self.reload_favorites().await?;
        Ok(())
    }

    async fn reload_favorites(&mut self) -> Result<()> {
        self.favorites = self.store.favorites().await?;
        self.favorite_dates = self.favorites.iter().map(|f| f.apod.date).collect();
        if self.favorites_index >= self.favorites.len() {
            self.favorites_index = self.favorites.len().saturating_sub(1);
        }
        Ok(())
    }

    async fn refresh_stats(&mut self) -> Result<()> {
        self.stats = self.store.stats().await?;
        Ok(())
    }

    /// Poll for completed page loads (non-blocking)
    pub async fn poll_page_result(&mut self) -> Result<()> {
        if let Ok(msg) = self.page_rx.try_recv() {
            // Results from before a refresh or cache clear are stale
            if msg.generation != self.generation {
                return Ok(());
            }

            self.is_loading = false;
            self.is_retrying = false;

            match msg.result {
                Ok(page) => {
                    self.error = None;
                    if msg.page == 0 {
                        self.items.clear();
                        self.selected_index = 0;
                    }
                    self.items.extend(page.items);
                    self.next_page = page.next;
                }
                Err(message) => {
                    tracing::warn!("Page {} load failed: {message}", msg.page);
                    self.error = Some(ErrorView::from_message(&message));
                }
            }
        }
        Ok(())
    }

    /// Poll for a completed by-date lookup (non-blocking)
    pub async fn poll_detail_result(&mut self) -> Result<()> {
        if let Ok(msg) = self.detail_rx.try_recv() {
            if msg.generation != self.generation {
                return Ok(());
            }

            self.detail_loading = false;

            match msg.result {
                Ok(apod) => {
                    self.open_detail(apod).await?;
                }
                Err(message) => {
                    tracing::warn!("Detail lookup failed: {message}");
                    self.error = Some(ErrorView::from_message(&message));
                }
            }
        }
        Ok(())
    }

    /// React to a cache-cleared broadcast: drop errors, re-run queries.
    pub async fn poll_cache_cleared(&mut self) -> Result<()> {
        if self.cache_cleared_rx.try_recv().is_ok() {
            self.error = None;
            self.reload_favorites().await?;
            self.refresh_stats().await?;
            self.refresh();
        }
        Ok(())
    }
}

/// Only hand well-formed URLs to the system opener.
fn open_link(link: &str) {
    if url::Url::parse(link).is_ok() {
        let _ = open::that(link);
    }
}
