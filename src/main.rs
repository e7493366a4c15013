use anyhow::anyhow;
use clap::Parser;
use eframe::egui;
use egui::{Color32, CornerRadius, RichText, ScrollArea, Stroke, Ui, ViewportBuilder};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

mod cancel;
mod chuck_client;
mod config;
mod db;
mod favorites;
mod favorites_hub;
mod jokes_feed;
mod list_rules;
mod logging;
mod models;
mod services;
mod toast;

use crate::cancel::CancelToken;
use crate::chuck_client::ChuckClient;
use crate::config::{AppConfig, Args, StorageLocation};
use crate::db::{Database, KeyValueStore, MemoryStore};
use crate::favorites_hub::{spawn_change_watcher, FavoritesHub, Subscription};
use crate::jokes_feed::{FeedNotice, JokesFeed};
use crate::models::Joke;
use crate::services::{FavoriteActions, ServiceError, Services};
use crate::toast::{ToastLevel, ToastQueue};

fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_args(Args::parse());

    if let Err(e) = logging::init_tracing(config.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    // Network and storage polling run here; the window stays on the main thread
    let runtime = tokio::runtime::Runtime::new()?;
    let client = Arc::new(ChuckClient::new(&config.client)?);

    let favorites = FavoritesHub::new(open_storage(&config.storage));
    let services = Services::new()
        .with_favorites(favorites)
        .with_toasts(Arc::new(ToastQueue::default()));

    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([900.0, 800.0])
            .with_min_inner_size([600.0, 500.0])
            .with_title("Chuck Jokes"),
        ..Default::default()
    };

    let handle = runtime.handle().clone();
    eframe::run_native(
        "Chuck Jokes",
        options,
        Box::new(move |cc| {
            let mut app = JokesReaderApp::new(cc.egui_ctx.clone(), &services, client, handle, &config)?;

            if let Some(storage) = cc.storage {
                // Try to load saved theme preference
                if let Some(theme_str) = storage.get_string("is_dark_mode") {
                    if let Ok(is_dark_mode) = theme_str.parse::<bool>() {
                        app.set_dark_mode(is_dark_mode);
                    }
                }
            }

            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow!("Failed to run window: {}", e))?;

    tracing::info!("window closed");
    Ok(())
}

/// Opens the configured favorites store. Failing to open it is not fatal:
/// the app then runs as if storage were unavailable.
fn open_storage(location: &StorageLocation) -> Option<Arc<dyn KeyValueStore>> {
    let opened = match location {
        StorageLocation::Disabled => {
            tracing::info!("favorites storage disabled");
            return None;
        }
        StorageLocation::Memory => {
            tracing::info!("favorites kept in memory for this session");
            return Some(Arc::new(MemoryStore::new()));
        }
        StorageLocation::DefaultDir => Database::open_default(),
        StorageLocation::Dir(dir) => Database::open_in_dir(dir),
    };

    match opened {
        Ok(db) => Some(Arc::new(db)),
        Err(e) => {
            tracing::warn!(error = %e, "favorites storage unavailable, favorites will not persist");
            None
        }
    }
}

struct AppTheme {
    background: Color32,
    card_background: Color32,
    header_background: Color32,
    text: Color32,
    secondary_text: Color32,
    highlight: Color32,
    separator: Color32,
    success: Color32,
    warning: Color32,
    danger: Color32,
    info: Color32,
    button_background: Color32,
    button_foreground: Color32,
    button_active_background: Color32,
    button_hover_background: Color32,
}

impl AppTheme {
    fn dark() -> Self {
        Self {
            background: Color32::from_rgb(18, 18, 18),
            card_background: Color32::from_rgb(30, 30, 30),
            header_background: Color32::from_rgb(42, 42, 42),
            text: Color32::from_rgb(240, 240, 240),
            secondary_text: Color32::from_rgb(180, 180, 180),
            highlight: Color32::from_rgb(255, 140, 0),
            separator: Color32::from_rgb(60, 60, 60),
            success: Color32::from_rgb(76, 175, 80),
            warning: Color32::from_rgb(255, 193, 7),
            danger: Color32::from_rgb(239, 83, 80),
            info: Color32::from_rgb(100, 181, 246),
            button_background: Color32::from_rgb(66, 66, 66),
            button_foreground: Color32::from_rgb(240, 240, 240),
            button_active_background: Color32::from_rgb(255, 140, 0),
            button_hover_background: Color32::from_rgb(80, 80, 80),
        }
    }

    fn light() -> Self {
        Self {
            background: Color32::from_rgb(245, 245, 245),
            card_background: Color32::from_rgb(255, 255, 255),
            header_background: Color32::from_rgb(235, 235, 235),
            text: Color32::from_rgb(20, 20, 20),
            secondary_text: Color32::from_rgb(90, 90, 90),
            highlight: Color32::from_rgb(220, 110, 0),
            separator: Color32::from_rgb(200, 200, 200),
            success: Color32::from_rgb(30, 110, 40),
            warning: Color32::from_rgb(190, 130, 0),
            danger: Color32::from_rgb(198, 40, 40),
            info: Color32::from_rgb(20, 100, 200),
            button_background: Color32::from_rgb(235, 235, 235),
            button_foreground: Color32::from_rgb(20, 20, 20),
            button_active_background: Color32::from_rgb(220, 110, 0),
            button_hover_background: Color32::from_rgb(210, 210, 210),
        }
    }

    fn apply_to_ctx(&self, ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();

        // Set base colors
        style.visuals.panel_fill = self.background;
        style.visuals.window_fill = self.card_background;
        style.visuals.window_stroke = Stroke::new(1.0, self.separator);
        style.visuals.widgets.noninteractive.bg_fill = self.card_background;

        // Set text colors
        style.visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text);

        // Set button styles
        style.visuals.widgets.inactive.bg_fill = self.button_background;
        style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.active.bg_fill = self.button_active_background;
        style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.hovered.bg_fill = self.button_hover_background;
        style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.button_foreground);

        // Set selection color
        style.visuals.selection.bg_fill = self.highlight;
        style.visuals.selection.stroke = Stroke::new(1.0, self.highlight);

        // Set various rounding amounts
        style.visuals.window_corner_radius = CornerRadius::same(8);
        style.visuals.menu_corner_radius = CornerRadius::same(6);
        style.visuals.widgets.noninteractive.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.inactive.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.hovered.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.active.corner_radius = CornerRadius::same(4);

        // Apply the style
        ctx.set_style(style);
    }

    // Badge color for a joke category, muted for anything unknown
    fn category_color(&self, category: &str) -> Color32 {
        match category {
            "dev" => self.info,
            "sport" => self.success,
            "animal" => self.danger,
            "nerdy" => self.highlight,
            _ => self.secondary_text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Jokes,
    Favorites,
}

// What a card shows on its right-hand side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardTrailing {
    Star,
    Remove,
}

// Collected while rendering, applied afterwards to keep borrows simple
enum CardAction {
    ToggleFavorite(Joke),
    Remove(String),
    Copy(String),
    Open(String),
}

struct JokesReaderApp {
    feed: JokesFeed<ChuckClient>,
    actions: FavoriteActions,
    theme: AppTheme,
    is_dark_mode: bool,
    current_tab: Tab,
    watcher_cancel: CancelToken,
    _favorites_subscription: Subscription,
    clipboard: Option<arboard::Clipboard>,
}

impl JokesReaderApp {
    fn new(
        ctx: egui::Context,
        services: &Services,
        client: Arc<ChuckClient>,
        runtime: Handle,
        config: &AppConfig,
    ) -> Result<Self, ServiceError> {
        let actions = FavoriteActions::from_services(services)?;

        let repaint_ctx = ctx.clone();
        let subscription = actions.favorites.subscribe(move || repaint_ctx.request_repaint());

        let watcher_cancel = CancelToken::new();
        spawn_change_watcher(
            &runtime,
            actions.favorites.clone(),
            config.watch_interval,
            watcher_cancel.clone(),
        );

        let mut feed = JokesFeed::new(client, runtime, config.feed.clone());
        feed.set_waker(move || ctx.request_repaint());
        feed.load_initial();

        let clipboard = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(e) => {
                tracing::warn!(error = %e, "clipboard unavailable");
                None
            }
        };

        Ok(Self {
            feed,
            actions,
            theme: AppTheme::dark(),
            is_dark_mode: true,
            current_tab: Tab::Jokes,
            watcher_cancel,
            _favorites_subscription: subscription,
            clipboard,
        })
    }

    fn set_dark_mode(&mut self, is_dark_mode: bool) {
        self.is_dark_mode = is_dark_mode;
        self.theme = if is_dark_mode {
            AppTheme::dark()
        } else {
            AppTheme::light()
        };
    }

    fn toggle_theme(&mut self) {
        self.set_dark_mode(!self.is_dark_mode);
    }

    fn open_link(&self, url: &str) {
        if let Err(e) = open::that(url) {
            tracing::warn!(error = %e, url, "failed to open URL");
        }
    }

    fn copy_text(&mut self, text: &str) {
        let Some(clipboard) = self.clipboard.as_mut() else {
            self.actions.toasts.error("Clipboard is not available.");
            return;
        };
        match clipboard.set_text(text.to_string()) {
            Ok(()) => self.actions.toasts.show(ToastLevel::Info, "Joke copied to clipboard."),
            Err(e) => {
                tracing::warn!(error = %e, "failed to copy joke");
                self.actions.toasts.error("Could not copy the joke.");
            }
        }
    }

    fn apply_card_action(&mut self, action: CardAction) {
        match action {
            CardAction::ToggleFavorite(joke) => {
                self.actions.toggle(&joke);
            }
            CardAction::Remove(id) => self.actions.remove(&id),
            CardAction::Copy(text) => self.copy_text(&text),
            CardAction::Open(url) => self.open_link(&url),
        }
    }

    fn process_keyboard_shortcuts(&mut self, ctx: &egui::Context) {
        let input = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Space), // Space - start/stop timer
                i.key_pressed(egui::Key::R),     // R - refresh the batch
                i.key_pressed(egui::Key::F),     // F - switch between jokes and favorites
                i.key_pressed(egui::Key::T),     // T - toggle theme
            )
        });

        if input.0 && self.current_tab == Tab::Jokes {
            self.feed.toggle_timer();
        }
        if input.1 && self.current_tab == Tab::Jokes && !self.feed.state().loading {
            self.feed.load_initial();
        }
        if input.2 {
            self.current_tab = match self.current_tab {
                Tab::Jokes => Tab::Favorites,
                Tab::Favorites => Tab::Jokes,
            };
        }
        if input.3 {
            self.toggle_theme();
        }
    }

    fn render_header(&mut self, ui: &mut Ui) {
        let count = self.actions.favorites.count();
        let capacity = self.actions.favorites.capacity();

        ui.horizontal(|ui| {
            // App title
            ui.heading(RichText::new("Chuck Jokes").color(self.theme.highlight).strong());
            ui.add_space(16.0);

            // Tab buttons, the favorites one doubles as the count badge
            for (tab, label) in [(Tab::Jokes, "Jokes".to_string()), (Tab::Favorites, format!("Favorites  {}", count))] {
                let active = self.current_tab == tab;
                let button = ui.add(
                    egui::Button::new(
                        RichText::new(label)
                            .size(15.0)
                            .color(if active { self.theme.highlight } else { self.theme.button_foreground }),
                    )
                    .corner_radius(CornerRadius::same(6))
                    .fill(if active { self.theme.header_background } else { self.theme.button_background })
                    .stroke(if active {
                        Stroke::new(2.0, self.theme.highlight)
                    } else {
                        Stroke::NONE
                    }),
                );
                let button = if tab == Tab::Favorites {
                    button.on_hover_text(format!("{} of {} favorites saved", count, capacity))
                } else {
                    button
                };
                if button.clicked() {
                    self.current_tab = tab;
                }
                if button.hovered() {
                    ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::PointingHand);
                }
            }

            // Theme toggle on the far right
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let icon = if self.is_dark_mode { "☀" } else { "🌙" };
                if ui
                    .add(egui::Button::new(RichText::new(icon).size(18.0)).frame(false))
                    .on_hover_text("Toggle theme (T)")
                    .clicked()
                {
                    self.toggle_theme();
                }
            });
        });
    }

    fn render_jokes_view(&mut self, ui: &mut Ui) {
        let settings = self.feed.settings().clone();
        ui.add_space(8.0);
        ui.heading(RichText::new("Jokes").size(26.0).color(self.theme.text).strong());
        ui.label(
            RichText::new(format!(
                "{} random jokes on load. The timer adds one every {} seconds (max {}).",
                settings.batch_size,
                settings.refresh_interval.as_secs(),
                settings.capacity
            ))
            .color(self.theme.secondary_text)
            .size(14.0),
        );
        ui.add_space(10.0);

        // Controls row
        ui.horizontal(|ui| {
            let running = self.feed.state().running;
            let timer_label = if running { "⏸ Stop Timer" } else { "▶ Start Timer" };
            let timer_btn = ui.add(
                egui::Button::new(RichText::new(timer_label).color(Color32::WHITE).size(14.0))
                    .fill(self.theme.highlight)
                    .corner_radius(CornerRadius::same(6)),
            );
            if timer_btn.clicked() {
                self.feed.toggle_timer();
            }

            let loading = self.feed.state().loading;
            let refresh_btn = ui.add_enabled(
                !loading,
                egui::Button::new(RichText::new(format!("⟳ Refresh {}", settings.batch_size)).size(14.0))
                    .corner_radius(CornerRadius::same(6)),
            );
            if refresh_btn.clicked() {
                self.feed.load_initial();
            }

            // Status pill
            let (pill_text, pill_color) = if running {
                ("● Running", self.theme.success)
            } else {
                ("● Paused", self.theme.secondary_text)
            };
            ui.add_space(6.0);
            ui.label(RichText::new(pill_text).color(pill_color).size(13.0));
        });
        ui.add_space(8.0);

        let state = self.feed.state().clone();
        // Show loading spinner while the batch is in flight
        if state.loading {
            ui.add_space(20.0);
            ui.vertical_centered(|ui| {
                ui.spinner();
                ui.add_space(8.0);
                ui.label(RichText::new("Loading jokes...").color(self.theme.secondary_text));
            });
            return;
        }

        // Initial batch failed, keep the list hidden until a retry
        if let Some(error) = &state.error {
            let mut retry = false;
            egui::Frame::new()
                .fill(self.theme.card_background)
                .stroke(Stroke::new(1.0, self.theme.danger))
                .corner_radius(CornerRadius::same(10))
                .inner_margin(14.0)
                .outer_margin(egui::vec2(8.0, 6.0))
                .show(ui, |ui| {
                    ui.label(RichText::new("Error").color(self.theme.danger).strong());
                    ui.label(RichText::new(error).color(self.theme.secondary_text));
                    ui.add_space(6.0);
                    retry = ui.button("Try again").clicked();
                });
            if retry {
                self.feed.load_initial();
            }
            return;
        }

        if let Some(tick_error) = &state.tick_error {
            ui.label(
                RichText::new(format!("⚠ Last refresh failed: {}", tick_error))
                    .color(self.theme.warning)
                    .size(13.0),
            );
        }

        let mut pending = Vec::new();
        ScrollArea::vertical()
            .id_salt("jokes_scroll_area")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for item in &state.items {
                    let is_favorite = self.actions.favorites.is_favorite(&item.joke.id);
                    if let Some(action) = self.render_joke_card(
                        ui,
                        &item.joke,
                        item.fetched_at_local(),
                        is_favorite,
                        CardTrailing::Star,
                    ) {
                        pending.push(action);
                    }
                }
            });

        for action in pending {
            self.apply_card_action(action);
        }
    }

    fn render_favorites_view(&mut self, ui: &mut Ui) {
        let favorites = self.actions.favorites.snapshot();
        let capacity = self.actions.favorites.capacity();

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.heading(RichText::new("Favorites").size(26.0).color(self.theme.text).strong());
                ui.label(
                    RichText::new(format!("{} / {} saved", favorites.len(), capacity))
                        .color(self.theme.secondary_text)
                        .size(14.0),
                );
            });

            if !favorites.is_empty() {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let clear_btn = ui.add(
                        egui::Button::new(RichText::new("Clear All").size(14.0).color(self.theme.danger))
                            .corner_radius(CornerRadius::same(4))
                            .fill(self.theme.button_background),
                    );
                    if clear_btn.clicked() {
                        self.actions.clear();
                    }
                });
            }
        });
        ui.add_space(10.0);

        // Empty state
        if favorites.is_empty() {
            ui.add_space(20.0);
            ui.vertical_centered(|ui| {
                ui.label(
                    RichText::new("No favorites yet")
                        .color(self.theme.secondary_text)
                        .italics(),
                );
                ui.add_space(8.0);
                ui.label(
                    RichText::new("Click the star on a joke to keep it here")
                        .color(self.theme.secondary_text)
                        .size(14.0),
                );
            });
            return;
        }

        let mut pending = Vec::new();
        ScrollArea::vertical()
            .id_salt("favorites_scroll_area")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for joke in favorites.iter() {
                    if let Some(action) = self.render_joke_card(ui, joke, None, true, CardTrailing::Remove) {
                        pending.push(action);
                    }
                }
            });

        for action in pending {
            self.apply_card_action(action);
        }
    }

    fn render_joke_card(
        &self,
        ui: &mut Ui,
        joke: &Joke,
        fetched_at: Option<String>,
        is_favorite: bool,
        trailing: CardTrailing,
    ) -> Option<CardAction> {
        let mut action = None;

        egui::Frame::new()
            .fill(self.theme.card_background)
            .corner_radius(CornerRadius::same(12))
            .stroke(Stroke::new(1.0, self.theme.separator))
            .inner_margin(12.0)
            .outer_margin(egui::vec2(8.0, 6.0))
            .show(ui, |ui| {
                // Top row: avatar, text, star or remove
                ui.horizontal(|ui| {
                    let avatar = ui.label(RichText::new("🥋").size(24.0));
                    if !joke.icon_url.is_empty() {
                        let _ = avatar.on_hover_text(&joke.icon_url);
                    }

                    let text_width = (ui.available_width() - 80.0).max(120.0);
                    ui.allocate_ui(egui::vec2(text_width, 0.0), |ui| {
                        ui.add(
                            egui::Label::new(RichText::new(&joke.value).color(self.theme.text).size(15.0))
                                .wrap(),
                        );
                    });

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::TOP), |ui| match trailing {
                        CardTrailing::Star => {
                            let (icon, color, hint) = if is_favorite {
                                ("★", self.theme.highlight, "Remove from favorites")
                            } else {
                                ("☆", self.theme.secondary_text, "Add to favorites")
                            };
                            let star = ui
                                .add(egui::Button::new(RichText::new(icon).size(22.0).color(color)).frame(false))
                                .on_hover_text(hint);
                            if star.clicked() {
                                action = Some(CardAction::ToggleFavorite(joke.clone()));
                            }
                        }
                        CardTrailing::Remove => {
                            let remove = ui.add(
                                egui::Button::new(RichText::new("Remove").color(self.theme.danger).size(13.0))
                                    .stroke(Stroke::new(1.0, self.theme.danger))
                                    .fill(self.theme.card_background)
                                    .corner_radius(CornerRadius::same(6)),
                            );
                            if remove.clicked() {
                                action = Some(CardAction::Remove(joke.id.clone()));
                            }
                        }
                    });
                });

                ui.add(egui::Separator::default().spacing(6.0));

                // Bottom row: categories and id on the left, time and actions on the right
                ui.horizontal(|ui| {
                    for category in &joke.categories {
                        egui::Frame::new()
                            .fill(self.theme.header_background)
                            .corner_radius(CornerRadius::same(6))
                            .inner_margin(egui::Margin::symmetric(6, 2))
                            .show(ui, |ui| {
                                ui.label(
                                    RichText::new(category)
                                        .size(11.0)
                                        .strong()
                                        .color(self.theme.category_color(category)),
                                );
                            });
                    }
                    ui.label(
                        RichText::new(joke.short_id())
                            .size(11.0)
                            .color(self.theme.secondary_text),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if !joke.url.is_empty()
                            && ui
                                .add(egui::Button::new(RichText::new("Open").size(11.0)).frame(false))
                                .on_hover_text(&joke.url)
                                .clicked()
                        {
                            action = Some(CardAction::Open(joke.url.clone()));
                        }
                        if ui
                            .add(egui::Button::new(RichText::new("Copy").size(11.0)).frame(false))
                            .clicked()
                        {
                            action = Some(CardAction::Copy(joke.value.clone()));
                        }
                        if let Some(time) = &fetched_at {
                            ui.label(
                                RichText::new(format!("🕑 {}", time))
                                    .size(11.0)
                                    .color(self.theme.secondary_text),
                            );
                        }
                    });
                });
            });

        action
    }

    fn render_toast(&self, ctx: &egui::Context) {
        let Some(toast) = self.actions.toasts.current() else {
            return;
        };

        // Border and icon color follow the level
        let color = match toast.level {
            ToastLevel::Info => self.theme.info,
            ToastLevel::Warning => self.theme.warning,
            ToastLevel::Error => self.theme.danger,
        };

        egui::Area::new(egui::Id::new("toast_area"))
            .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -24.0))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::new()
                    .fill(self.theme.card_background)
                    .stroke(Stroke::new(1.0, color))
                    .corner_radius(CornerRadius::same(8))
                    .inner_margin(12.0)
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.label(RichText::new(toast.level.icon()).color(color));
                            ui.label(RichText::new(&toast.message).color(self.theme.text));
                            ui.add_space(8.0);
                            if ui
                                .add(egui::Button::new("✕").frame(false))
                                .on_hover_text("Dismiss")
                                .clicked()
                            {
                                self.actions.toasts.dismiss();
                            }
                        });
                    });
            });

        // Wake up again to hide the toast once it expires
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

impl eframe::App for JokesReaderApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        storage.set_string("is_dark_mode", self.is_dark_mode.to_string());
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Apply theme
        self.theme.apply_to_ctx(ctx);

        // Pick up finished fetches
        for notice in self.feed.poll() {
            if let FeedNotice::TickFailed(message) = notice {
                self.actions.toasts.error(message);
            }
        }

        // Handle keyboard shortcuts
        self.process_keyboard_shortcuts(ctx);

        // Header with tabs
        egui::TopBottomPanel::top("header_panel")
            .frame(
                egui::Frame::new()
                    .fill(self.theme.header_background)
                    .inner_margin(10.0),
            )
            .show(ctx, |ui| self.render_header(ui));

        // Main content
        egui::CentralPanel::default().show(ctx, |ui| match self.current_tab {
            Tab::Jokes => self.render_jokes_view(ui),
            Tab::Favorites => self.render_favorites_view(ui),
        });

        // Toast overlay on top of everything
        self.render_toast(ctx);
    }
}

impl Drop for JokesReaderApp {
    fn drop(&mut self) {
        self.watcher_cancel.cancel();
        self.feed.shutdown();
    }
}
