use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};

use cosmic::app::{Core, Task as CosmicTask, context_drawer};
use cosmic::iced::widget::image::Handle;
use cosmic::iced::{Length, Subscription, window};
use cosmic::widget::{button, container, icon, row, scrollable};
use cosmic::{Application, Element, executor};

use studyboard::config::BoardConfig;
use studyboard::core::background::{self, AutoRefreshGate, BackgroundMode, BackgroundSettings};
use studyboard::core::date;
use studyboard::core::quote::{QuoteState, QuoteTicker};
use studyboard::core::subject::SubjectBoard;
use studyboard::core::transition::{Effect, Event, Transition, swap_scheduled_for};
use studyboard::core::upload::{self, ACCEPTED_EXTENSIONS, UploadError};
use studyboard::remote::{self, loader, quote};
use studyboard::store::{self, JsonFileStore, MemoryStore, SettingsRepository};

use crate::fl;
use crate::message::Message;
use crate::pages;

pub const APP_ID: &str = "dev.studyboard.app";

/// Clock resolution for the quote ticker, daily refresh check and heading.
const CLOCK_PERIOD: Duration = Duration::from_secs(1);
/// Frame period of the fade-in animation.
const FADE_FRAME: Duration = Duration::from_millis(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextDrawerState {
    Background,
}

pub struct Board {
    core: Core,
    config: BoardConfig,
    cosmic_config: cosmic::cosmic_config::Config,
    store: Box<dyn SettingsRepository>,
    http: reqwest::Client,
    context_drawer_state: Option<ContextDrawerState>,

    // Background
    background: BackgroundSettings,
    transition: Transition,
    refresh_gate: AutoRefreshGate,
    default_image: Option<Handle>,
    /// Image currently on screen.
    visible_image: Option<Handle>,
    /// Preloaded image waiting for its swap, tagged with the request generation.
    pending_image: Option<(u64, Handle)>,
    fade_started: Option<Instant>,
    upload_error: Option<String>,

    // Subjects
    subjects: SubjectBoard,

    // Quote
    quote: QuoteState,
    ticker: QuoteTicker,
    interval_input: String,
    show_quote_settings: bool,

    // Heading
    today: NaiveDate,
    heading: String,
}

pub struct Flags {
    pub config: BoardConfig,
    pub cosmic_config: cosmic::cosmic_config::Config,
}

impl Application for Board {
    type Executor = executor::Default;
    type Flags = Flags;
    type Message = Message;

    const APP_ID: &'static str = APP_ID;

    fn core(&self) -> &Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut Core {
        &mut self.core
    }

    fn init(core: Core, flags: Self::Flags) -> (Self, CosmicTask<Self::Message>) {
        let config = flags.config;
        let cosmic_config = flags.cosmic_config;

        let store: Box<dyn SettingsRepository> = match config.ensure_data_dir() {
            Ok(()) => Box::new(JsonFileStore::new(
                config.background_path(),
                config.subjects_path(),
            )),
            Err(e) => {
                log::error!(
                    "Failed to create data directory {}: {}; changes will not be kept",
                    config.data_directory.display(),
                    e
                );
                Box::new(MemoryStore::default())
            }
        };

        let background = store::load_background_or_default(store.as_ref());
        let subjects = store
            .load_subjects()
            .map(SubjectBoard::new)
            .unwrap_or_default();

        let default_image = loader::default_background_bytes().map(Handle::from_bytes);
        if default_image.is_none() {
            log::error!("Built-in background is missing from the binary");
        }

        let today = Local::now().date_naive();
        let ticker = QuoteTicker::new(config.quote_interval());

        let mut app = Self {
            core,
            interval_input: ticker.interval_secs().to_string(),
            config,
            cosmic_config,
            store,
            http: remote::http_client(),
            context_drawer_state: None,
            background,
            transition: Transition::default(),
            refresh_gate: AutoRefreshGate::default(),
            visible_image: default_image.clone(),
            default_image,
            pending_image: None,
            fade_started: None,
            upload_error: None,
            subjects,
            quote: QuoteState::default(),
            ticker,
            show_quote_settings: false,
            today,
            heading: date::heading(today),
        };

        let now = Instant::now();
        app.ticker.start(now);
        let quote_task = app.fetch_quote();

        let background_task = if app.daily_refresh_due(now) {
            log::info!("Daily image is due for a refresh");
            app.select_background(BackgroundMode::DailyRemote, true)
        } else {
            let settings = app.background.clone();
            app.apply_background(settings, false)
        };

        (app, CosmicTask::batch(vec![quote_task, background_task]))
    }

    fn header_end(&self) -> Vec<Element<'_, Message>> {
        vec![
            row()
                .spacing(4)
                .push(
                    button::icon(icon::from_name("preferences-desktop-wallpaper-symbolic"))
                        .on_press(Message::ToggleBackgroundPanel),
                )
                .into(),
        ]
    }

    fn context_drawer(&self) -> Option<context_drawer::ContextDrawer<'_, Message>> {
        match self.context_drawer_state? {
            ContextDrawerState::Background => Some(
                context_drawer::context_drawer(
                    container(scrollable(pages::background::background_panel(
                        &self.background,
                        self.transition.is_loading(),
                        self.upload_error.as_deref(),
                        self.config.debug_logging,
                    )))
                    .width(Length::Fill),
                    Message::ToggleBackgroundPanel,
                )
                .title(fl!("background-title")),
            ),
        }
    }

    fn on_escape(&mut self) -> CosmicTask<Message> {
        if self.subjects.editing().is_some() {
            self.subjects.cancel();
        } else if self.context_drawer_state.is_some() {
            self.context_drawer_state = None;
            self.core.window.show_context = false;
        } else if self.show_quote_settings {
            self.show_quote_settings = false;
        }
        CosmicTask::none()
    }

    fn on_close_requested(&self, _id: window::Id) -> Option<Message> {
        Some(Message::CloseRequested)
    }

    fn subscription(&self) -> Subscription<Message> {
        let keys = cosmic::iced::event::listen_with(|event, _status, _id| match event {
            cosmic::iced::Event::Keyboard(cosmic::iced::keyboard::Event::KeyPressed {
                key: cosmic::iced::keyboard::Key::Character(ref c),
                modifiers,
                ..
            }) if c.as_str() == "b" && modifiers.control() => Some(Message::ToggleBackgroundPanel),
            _ => None,
        });
        let clock = cosmic::iced::time::every(CLOCK_PERIOD).map(Message::Tick);

        let mut subscriptions = vec![keys, clock];
        if self.transition.is_fading() {
            subscriptions.push(cosmic::iced::time::every(FADE_FRAME).map(Message::FadeFrame));
        }
        Subscription::batch(subscriptions)
    }

    fn update(&mut self, message: Message) -> CosmicTask<Message> {
        match message {
            Message::Tick(now) => {
                let mut batch = Vec::new();
                if self.ticker.is_running() && self.ticker.poll(now) {
                    batch.push(self.fetch_quote());
                }

                let today = Local::now().date_naive();
                if today != self.today {
                    self.today = today;
                    self.heading = date::heading(today);
                }

                if self.daily_refresh_due(now) {
                    log::info!("Daily image refresh due, fetching a new image");
                    batch.push(self.select_background(BackgroundMode::DailyRemote, true));
                }

                if !batch.is_empty() {
                    return CosmicTask::batch(batch);
                }
            }

            Message::CloseRequested => {
                log::debug!("Window closing, stopping quote timer");
                self.ticker.stop();
            }

            Message::FadeFrame(now) => {
                let elapsed = self
                    .fade_started
                    .map(|start| now.saturating_duration_since(start))
                    .unwrap_or_default();
                let effects = self.transition.handle(Event::FadeStep(elapsed));
                if !self.transition.is_fading() {
                    self.fade_started = None;
                }
                return self.run_effects(effects);
            }

            Message::ToggleBackgroundPanel => {
                if self.context_drawer_state.is_some() {
                    self.context_drawer_state = None;
                    self.core.window.show_context = false;
                } else {
                    self.context_drawer_state = Some(ContextDrawerState::Background);
                    self.core.window.show_context = true;
                }
            }

            Message::SelectBackground(mode) => {
                if self.transition.is_loading() {
                    log::debug!("Ignoring background selection while an image is loading");
                    return CosmicTask::none();
                }
                return self.select_background(mode, false);
            }

            Message::RefreshDailyImage => {
                if !self.transition.is_loading() {
                    return self.select_background(BackgroundMode::DailyRemote, true);
                }
            }

            Message::PickCustomImage => {
                return self.pick_custom_image();
            }

            Message::CustomImagePicked(path) => {
                if let Some(path) = path {
                    return CosmicTask::perform(upload::read_upload(path), |result| {
                        cosmic::Action::App(Message::CustomImageRead(result))
                    });
                }
            }

            Message::CustomImageRead(result) => match result {
                Ok(data_url) => {
                    self.upload_error = None;
                    let settings = BackgroundSettings::custom(data_url);
                    self.background = settings.clone();
                    self.persist_background();
                    return self.apply_background(settings, false);
                }
                Err(e) => {
                    log::warn!("Rejected custom background: {}", e);
                    self.upload_error = Some(upload_error_text(&e));
                }
            },

            Message::DismissUploadError => {
                self.upload_error = None;
            }

            Message::ImagePreloaded(request, result) => {
                let generation = request.generation;
                let (image, ok) = match result {
                    Ok(img) => (Some(img), true),
                    Err(e) => {
                        log::warn!("Preload of {} failed: {}", request.target.describe(), e);
                        (None, false)
                    }
                };
                let effects = self.transition.handle(Event::Preloaded { request, ok });
                if let Some(img) = image {
                    if swap_scheduled_for(&effects, generation) {
                        self.pending_image =
                            Some((generation, Handle::from_rgba(img.width, img.height, img.rgba)));
                    } else {
                        log::debug!("Discarding image of superseded generation {}", generation);
                    }
                }
                return self.run_effects(effects);
            }

            Message::SwapDue(request) => {
                let generation = request.generation;
                let effects = self.transition.handle(Event::SwapDue(request));
                if !effects.is_empty() {
                    match self.pending_image.take() {
                        Some((pending, handle)) if pending == generation => {
                            self.visible_image = Some(handle);
                        }
                        _ => log::warn!("No preloaded image for generation {}", generation),
                    }
                }
                return self.run_effects(effects);
            }

            Message::RetryDue(request) => {
                let effects = self.transition.handle(Event::RetryDue(request));
                return self.run_effects(effects);
            }

            Message::DismissNotice(id) => {
                let effects = self.transition.handle(Event::DismissNotice(id));
                return self.run_effects(effects);
            }

            Message::EditSubject(index) => {
                self.subjects.edit(index);
            }

            Message::SubjectInputChanged(value) => {
                self.subjects.input(value);
            }

            Message::SaveSubject(index) => {
                if self.subjects.editing().is_none_or(|buffer| buffer.index != index) {
                    return CosmicTask::none();
                }
                if let Some(entries) = self.subjects.commit() {
                    if let Err(e) = self.store.save_subjects(entries) {
                        log::error!("Failed to save subjects: {}", e);
                    }
                }
            }

            Message::CancelEdit => {
                self.subjects.cancel();
            }

            Message::QuoteFetched(result) => {
                self.quote.finish(result);
            }

            Message::ToggleQuoteSettings => {
                self.show_quote_settings = !self.show_quote_settings;
                self.interval_input = self.ticker.interval_secs().to_string();
            }

            Message::QuoteIntervalInput(value) => {
                if let Ok(secs) = value.trim().parse::<u32>() {
                    if secs != self.ticker.interval_secs()
                        && self.ticker.set_interval(secs, Instant::now())
                    {
                        log::info!("Quote interval set to {}s", secs);
                        self.config.quote_interval_secs = secs;
                        self.save_config();
                    }
                }
                self.interval_input = value;
            }

            Message::ToggleDebugLogging => {
                self.config.debug_logging = !self.config.debug_logging;
                studyboard::set_debug_logging(self.config.debug_logging);
                self.save_config();
            }
        }

        CosmicTask::none()
    }

    fn view(&self) -> Element<'_, Message> {
        pages::board::board_view(pages::board::BoardCtx {
            heading: &self.heading,
            image: self.visible_image.as_ref(),
            opacity: self.transition.opacity(),
            loading: self.transition.is_loading(),
            notice: self.transition.notice(),
            upload_error: self.upload_error.as_deref(),
            subjects: &self.subjects,
            quote: &self.quote,
            show_quote_settings: self.show_quote_settings,
            interval_input: &self.interval_input,
        })
    }
}

impl Board {
    /// Whether the automatic daily refresh should run now.
    fn daily_refresh_due(&mut self, now: Instant) -> bool {
        self.background.mode == BackgroundMode::DailyRemote
            && !self.transition.is_loading()
            && background::should_refresh(self.background.last_refreshed_at, Local::now())
            && self.refresh_gate.try_begin(now)
    }

    fn select_background(&mut self, mode: BackgroundMode, force: bool) -> CosmicTask<Message> {
        let resolved = background::resolve(
            mode,
            &self.background,
            force,
            Local::now(),
            &self.config.daily_image_url,
        );
        let Some(resolved) = resolved else {
            // Custom without an image yet: ask for one first.
            return self.pick_custom_image();
        };

        self.background = resolved.settings.clone();
        self.persist_background();
        self.apply_background(resolved.settings, resolved.forced)
    }

    fn apply_background(
        &mut self,
        settings: BackgroundSettings,
        forced: bool,
    ) -> CosmicTask<Message> {
        let effects = self.transition.handle(Event::Apply { settings, forced });
        self.run_effects(effects)
    }

    fn run_effects(&mut self, effects: Vec<Effect>) -> CosmicTask<Message> {
        let mut batch = Vec::new();

        for effect in effects {
            match effect {
                Effect::Preload(request) => {
                    let client = self.http.clone();
                    let source = request.target.clone();
                    batch.push(CosmicTask::perform(
                        async move {
                            loader::load(client, source).await.map_err(|e| e.to_string())
                        },
                        move |result| cosmic::Action::App(Message::ImagePreloaded(request, result)),
                    ));
                }
                Effect::ScheduleSwap(request, delay) => {
                    batch.push(CosmicTask::perform(tokio::time::sleep(delay), move |_| {
                        cosmic::Action::App(Message::SwapDue(request))
                    }));
                }
                Effect::ScheduleRetry(request, delay) => {
                    batch.push(CosmicTask::perform(tokio::time::sleep(delay), move |_| {
                        cosmic::Action::App(Message::RetryDue(request))
                    }));
                }
                Effect::FallBackToDefault => {
                    self.background = BackgroundSettings::default();
                    self.persist_background();
                    self.pending_image = None;
                    self.visible_image = self.default_image.clone();
                }
                Effect::StartFade => {
                    self.fade_started = Some(Instant::now());
                }
                Effect::ScheduleNoticeDismiss(id, delay) => {
                    batch.push(CosmicTask::perform(tokio::time::sleep(delay), move |_| {
                        cosmic::Action::App(Message::DismissNotice(id))
                    }));
                }
            }
        }

        if batch.is_empty() {
            CosmicTask::none()
        } else {
            CosmicTask::batch(batch)
        }
    }

    fn pick_custom_image(&self) -> CosmicTask<Message> {
        CosmicTask::perform(
            async {
                rfd::AsyncFileDialog::new()
                    .add_filter("JPEG / PNG", ACCEPTED_EXTENSIONS)
                    .pick_file()
                    .await
                    .map(|file| file.path().to_path_buf())
            },
            |path| cosmic::Action::App(Message::CustomImagePicked(path)),
        )
    }

    fn fetch_quote(&mut self) -> CosmicTask<Message> {
        self.quote.loading = true;
        CosmicTask::perform(
            quote::fetch_quote_quietly(self.http.clone(), self.config.quote_url.clone()),
            |result| cosmic::Action::App(Message::QuoteFetched(result)),
        )
    }

    fn persist_background(&self) {
        if let Err(e) = self.store.save_background(&self.background) {
            log::error!("Failed to save background settings: {}", e);
        }
    }

    fn save_config(&self) {
        use cosmic::cosmic_config::CosmicConfigEntry;
        if let Err(e) = self.config.write_entry(&self.cosmic_config) {
            log::error!("Failed to save config: {:?}", e);
        }
    }
}

fn upload_error_text(e: &UploadError) -> String {
    match e {
        UploadError::TooLarge { .. } => fl!("upload-too-large"),
        UploadError::UnsupportedFormat => fl!("upload-unsupported"),
        UploadError::Read { reason, .. } => fl!("upload-read-failed", reason = reason.clone()),
    }
}
