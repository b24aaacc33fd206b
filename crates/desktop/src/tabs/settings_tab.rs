use std::path::Path;

use iced::widget::{button, checkbox, column, container, pick_list, row, slider, text, Space};
use iced::{Element, Length, Theme};

use crate::app::{scaled, Message};
use crate::settings::{Appearance, Settings, DATA_DIR_ENV};
use crate::theme::tertiary_color;

pub fn view<'a>(settings: &Settings, data_dir: &Path, theme: &Theme) -> Element<'a, Message> {
    let fs = settings.font_scale;
    let tertiary = tertiary_color(theme);

    let env_note: Element<'a, Message> = if std::env::var_os(DATA_DIR_ENV).is_some() {
        text(format!("Set by {DATA_DIR_ENV}"))
            .size(scaled(12.0, fs))
            .color(tertiary)
            .into()
    } else {
        Space::new().height(0).into()
    };

    column![
        text("Movie data").size(scaled(16.0, fs)),
        Space::new().height(8),
        path_row("Data folder", data_dir.display().to_string(), fs),
        env_note,
        path_row("Scenes", settings.scenes_file.clone(), fs),
        path_row("Video", settings.video_file.clone(), fs),
        path_row("Banner", settings.banner_file.clone(), fs),
        Space::new().height(8),
        row![
            button(text("Choose Scenes File\u{2026}").size(scaled(13.0, fs)))
                .on_press(Message::ChooseScenesFile)
                .padding([8, 16]),
            button(text("Reload").size(scaled(13.0, fs)))
                .on_press(Message::ReloadScenes)
                .padding([8, 16])
                .style(button::secondary),
        ]
        .spacing(8),
        Space::new().height(24),
        text("Theme").size(scaled(16.0, fs)),
        Space::new().height(8),
        row![
            text("Mode").size(scaled(13.0, fs)),
            pick_list(Appearance::ALL, Some(settings.appearance), |a| {
                Message::AppearanceChanged(a)
            })
            .text_size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
        Space::new().height(12),
        checkbox(settings.high_contrast)
            .label("High contrast")
            .on_toggle(Message::HighContrastChanged)
            .text_size(scaled(13.0, fs)),
        Space::new().height(20),
        text("Font size").size(scaled(16.0, fs)),
        Space::new().height(8),
        row![
            slider(0.8..=1.5, settings.font_scale, Message::FontScaleChanged).step(0.05),
            text(format!("{:.0}%", settings.font_scale * 100.0)).size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
    ]
    .spacing(0)
    .into()
}

fn path_row<'a>(label: &str, value: String, fs: f32) -> Element<'a, Message> {
    row![
        container(text(label.to_owned()).size(scaled(13.0, fs))).width(110),
        text(value).size(scaled(13.0, fs)).width(Length::Fill),
    ]
    .spacing(8)
    .padding([4, 0])
    .into()
}
