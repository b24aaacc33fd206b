use std::path::{Path, PathBuf};
use std::time::Duration;

use iced::widget::{button, column, container, image, row, scrollable, stack, text, Space};
use iced::{Color, ContentFit, Element, Length, Subscription, Task, Theme};

use cinescope_core::scenes::infrastructure::scene_file;

use crate::browser::SceneBrowser;
use crate::settings::{Appearance, Settings};
use crate::tabs;
use crate::theme;
use crate::workers::frame_worker::FrameWorker;

const PREVIEW_POLL_INTERVAL: Duration = Duration::from_millis(50);
const BANNER_DIM: f32 = 0.6;

// ---------------------------------------------------------------------------
// Tab enum
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Scenes,
    Settings,
    About,
}

impl Tab {
    const ALL: &[Tab] = &[Tab::Scenes, Tab::Settings, Tab::About];

    fn label(self) -> &'static str {
        match self {
            Tab::Scenes => "Scenes",
            Tab::Settings => "Settings",
            Tab::About => "About",
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Message {
    TabSelected(Tab),
    TimeChanged(f64),
    PreviousScene,
    NextScene,
    JumpTo(f64),
    OpenInPlayer,
    ChooseScenesFile,
    ScenesFileChosen(Option<PathBuf>),
    ReloadScenes,
    ToggleMovieDescription,
    ActorHover(usize, bool),
    PollPreview,
    AppearanceChanged(Appearance),
    HighContrastChanged(bool),
    FontScaleChanged(f32),
    PollSystemTheme,
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    active_tab: Tab,
    pub settings: Settings,
    pub data_dir: PathBuf,
    pub scenes_path: PathBuf,
    pub video_path: PathBuf,
    pub video_exists: bool,
    pub banner: Option<image::Handle>,
    pub banner_notice: Option<String>,
    pub browser: SceneBrowser,
    pub load_error: Option<String>,
    pub preview: Option<image::Handle>,
    pub preview_error: Option<String>,
    pub hovered_actor: Option<usize>,
    pub show_movie_description: bool,
    frame_worker: FrameWorker,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        let settings = Settings::load();
        let data_dir = settings.data_dir();
        let mut app = Self {
            active_tab: Tab::Scenes,
            scenes_path: settings.scenes_path(&data_dir),
            video_path: settings.video_path(&data_dir),
            video_exists: false,
            banner: None,
            banner_notice: None,
            browser: SceneBrowser::default(),
            load_error: None,
            preview: None,
            preview_error: None,
            hovered_actor: None,
            show_movie_description: false,
            frame_worker: FrameWorker::spawn(),
            settings,
            data_dir,
        };
        app.reload();
        (app, Task::none())
    }

    /// Re-reads the scene list and re-checks the media files.
    fn reload(&mut self) {
        self.scenes_path = self.settings.scenes_path(&self.data_dir);
        self.video_path = self.settings.video_path(&self.data_dir);
        self.video_exists = self.video_path.is_file();
        if !self.video_exists {
            log::warn!("Video file not found: {}", self.video_path.display());
        }

        let banner_path = self.settings.banner_path(&self.data_dir);
        self.banner_notice = missing_banner(banner_path.as_deref());
        self.banner = match &self.banner_notice {
            None => banner_path.map(image::Handle::from_path),
            Some(notice) => {
                log::warn!("{notice}");
                None
            }
        };

        let (browser, load_error) = load_scenes(&self.scenes_path);
        self.browser = browser;
        self.load_error = load_error;
        self.hovered_actor = None;
        self.preview = None;
        self.preview_error = None;
        self.request_preview();
    }

    fn request_preview(&mut self) {
        if self.video_exists && !self.browser.is_empty() {
            self.frame_worker
                .request(&self.video_path, self.browser.current_time());
        }
    }

    fn after_seek(&mut self) {
        self.hovered_actor = None;
        self.request_preview();
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::TabSelected(tab) => {
                self.active_tab = tab;
            }
            Message::TimeChanged(t) => {
                self.browser.seek(t);
                self.after_seek();
            }
            Message::PreviousScene => {
                if self.browser.previous_scene() {
                    self.after_seek();
                }
            }
            Message::NextScene => {
                if self.browser.next_scene() {
                    self.after_seek();
                }
            }
            Message::JumpTo(start) => {
                self.browser.seek(start);
                self.after_seek();
            }
            Message::OpenInPlayer => {
                if let Err(e) = open::that(&self.video_path) {
                    log::warn!("Cannot open {}: {e}", self.video_path.display());
                }
            }
            Message::ChooseScenesFile => {
                let start_dir = self.data_dir.clone();
                return Task::perform(
                    async move {
                        rfd::AsyncFileDialog::new()
                            .set_title("Select scenes file")
                            .add_filter("Scene list", &["json"])
                            .set_directory(start_dir)
                            .pick_file()
                            .await
                            .map(|h| h.path().to_path_buf())
                    },
                    Message::ScenesFileChosen,
                );
            }
            Message::ScenesFileChosen(Some(path)) => {
                if let (Some(dir), Some(name)) = (path.parent(), path.file_name()) {
                    self.data_dir = dir.to_path_buf();
                    self.settings.data_dir = Some(self.data_dir.clone());
                    self.settings.scenes_file = name.to_string_lossy().into_owned();
                    self.settings.save();
                    self.reload();
                    self.active_tab = Tab::Scenes;
                }
            }
            Message::ScenesFileChosen(None) => {}
            Message::ReloadScenes => {
                self.reload();
            }
            Message::ToggleMovieDescription => {
                self.show_movie_description = !self.show_movie_description;
            }
            Message::ActorHover(id, true) => {
                self.hovered_actor = Some(id);
            }
            Message::ActorHover(id, false) => {
                if self.hovered_actor == Some(id) {
                    self.hovered_actor = None;
                }
            }
            Message::PollPreview => match self.frame_worker.poll() {
                Some(Ok(frame)) => {
                    self.preview = Some(image::Handle::from_rgba(
                        frame.width,
                        frame.height,
                        frame.rgba,
                    ));
                    self.preview_error = None;
                }
                Some(Err(e)) => {
                    self.preview = None;
                    self.preview_error = Some(e);
                }
                None => {}
            },
            Message::AppearanceChanged(appearance) => {
                self.settings.appearance = appearance;
                self.settings.save();
            }
            Message::HighContrastChanged(enabled) => {
                self.settings.high_contrast = enabled;
                self.settings.save();
            }
            Message::FontScaleChanged(scale) => {
                self.settings.font_scale = scale;
                self.settings.save();
            }
            Message::PollSystemTheme => {
                // Theme is resolved fresh in theme() on every render,
                // so just requesting a redraw is enough.
            }
        }
        Task::none()
    }

    pub fn view(&self) -> Element<'_, Message> {
        let fs = self.settings.font_scale;
        let theme = self.theme();

        let tab_bar = row(Tab::ALL
            .iter()
            .map(|&tab| {
                let label = text(tab.label()).size(scaled(13.0, fs));
                let btn = button(label)
                    .on_press(Message::TabSelected(tab))
                    .padding([6, 14]);
                if tab == self.active_tab {
                    btn.style(button::primary).into()
                } else {
                    btn.style(button::text).into()
                }
            })
            .collect::<Vec<_>>())
        .spacing(2);

        let content: Element<'_, Message> = match self.active_tab {
            Tab::Scenes => tabs::scenes_tab::view(self, &theme),
            Tab::Settings => tabs::settings_tab::view(&self.settings, &self.data_dir, &theme),
            Tab::About => tabs::about_tab::view(fs),
        };

        let body = column![
            tab_bar,
            container(scrollable(content).height(Length::Fill))
                .padding(16)
                .height(Length::Fill),
        ]
        .spacing(0)
        .height(Length::Fill);

        match &self.banner {
            Some(banner) => stack![
                image(banner.clone())
                    .width(Length::Fill)
                    .height(Length::Fill)
                    .content_fit(ContentFit::Cover),
                container(Space::new().width(Length::Fill).height(Length::Fill)).style(
                    |_theme: &Theme| container::Style {
                        background: Some(Color::from_rgba(0.0, 0.0, 0.0, BANNER_DIM).into()),
                        ..container::Style::default()
                    }
                ),
                body,
            ]
            .into(),
            None => body.into(),
        }
    }

    pub fn theme(&self) -> Theme {
        theme::resolve_theme(self.settings.appearance, self.settings.high_contrast)
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let preview = if self.frame_worker.is_pending() {
            iced::time::every(PREVIEW_POLL_INTERVAL).map(|_| Message::PollPreview)
        } else {
            Subscription::none()
        };
        let system_theme = if self.settings.appearance == Appearance::System {
            iced::time::every(Duration::from_secs(2)).map(|_| Message::PollSystemTheme)
        } else {
            Subscription::none()
        };
        Subscription::batch([preview, system_theme])
    }
}

/// Scale a base font size by the user's font_scale setting.
pub fn scaled(base: f32, font_scale: f32) -> f32 {
    (base * font_scale).round()
}

/// Notice for a configured banner image that is not on disk.
fn missing_banner(path: Option<&Path>) -> Option<String> {
    let path = path?;
    (!path.is_file()).then(|| format!("Banner not found: {}", path.display()))
}

/// A missing or unreadable scene list yields an empty browser and the
/// message to show in its place.
fn load_scenes(path: &Path) -> (SceneBrowser, Option<String>) {
    if !path.is_file() {
        log::warn!("Scene file not found: {}", path.display());
        return (
            SceneBrowser::default(),
            Some(format!("Scene file {} not found!", path.display())),
        );
    }
    match scene_file::load(path) {
        Ok(timeline) => {
            log::info!("Loaded {} scenes from {}", timeline.len(), path.display());
            (SceneBrowser::new(timeline), None)
        }
        Err(e) => {
            log::error!("{e}");
            (SceneBrowser::default(), Some(e.to_string()))
        }
    }
}
