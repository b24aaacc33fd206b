use std::path::Path;

use iced::widget::{button, column, container, image, text};
use iced::{Color, Element, Theme};

use cinescope_core::scenes::domain::scene::Scene;

use crate::app::{scaled, Message};
use crate::theme::{muted_color, surface_color};

const THUMB_WIDTH: f32 = 120.0;
const CORNER_RADIUS: f32 = 6.0;
const ACTIVE_BORDER: f32 = 3.0;

/// One entry of the scene strip.
pub fn scene_card<'a>(
    scene: &Scene,
    data_dir: &Path,
    active: bool,
    fs: f32,
    theme: &Theme,
) -> Element<'a, Message> {
    let label = scene.label();
    let highlight = theme.palette().success;
    let surface = surface_color(theme);

    let thumbnail: Element<'a, Message> = match scene
        .thumbnail_path(data_dir)
        .filter(|p| p.is_file())
    {
        Some(path) => image(image::Handle::from_path(path))
            .width(THUMB_WIDTH)
            .border_radius(CORNER_RADIUS - 2.0)
            .into(),
        None => container(text("No thumbnail").size(scaled(12.0, fs)))
            .center_x(THUMB_WIDTH)
            .center_y(THUMB_WIDTH * 9.0 / 16.0)
            .into(),
    };

    let caption = text(format!("Scene {label}"))
        .size(scaled(16.0, fs))
        .font(iced::Font {
            weight: iced::font::Weight::Bold,
            ..iced::Font::DEFAULT
        });
    let times = text(format!("{}\u{2013}{} s", scene.start, scene.end))
        .size(scaled(13.0, fs))
        .color(muted_color(theme));

    let jump = button(text(format!("\u{25B6} {label}")).size(scaled(13.0, fs)))
        .on_press(Message::JumpTo(scene.start))
        .padding([4, 12])
        .style(if active {
            button::primary
        } else {
            button::secondary
        });

    container(
        column![thumbnail, caption, times, jump]
            .spacing(4)
            .align_x(iced::Alignment::Center),
    )
    .padding(4)
    .style(move |_theme: &Theme| container::Style {
        background: Some(
            Color {
                a: 0.6,
                ..surface
            }
            .into(),
        ),
        border: iced::border::Border {
            color: if active { highlight } else { Color::TRANSPARENT },
            width: ACTIVE_BORDER,
            radius: CORNER_RADIUS.into(),
        },
        ..container::Style::default()
    })
    .into()
}
