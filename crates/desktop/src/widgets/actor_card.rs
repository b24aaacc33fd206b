use std::path::{Path, PathBuf};
use std::time::Duration;

use iced::widget::{column, container, image, mouse_area, text};
use iced::{Color, Element, Length, Theme};
use iced_anim::transition::Easing;
use iced_anim::AnimationBuilder;

use crate::app::{scaled, Message};
use crate::theme::surface_color;

const CORNER_RADIUS: f32 = 8.0;
const SCALE_GROW: f32 = 6.0;
const ANIMATION_DURATION: Duration = Duration::from_millis(200);

/// Portrait edge at rest.
const IMG_SIZE: f32 = 110.0;

/// Grid footprint of one card; the hovered card grows inside it.
pub const FULL_CARD_WIDTH: f32 = IMG_SIZE + SCALE_GROW * 2.0 + 20.0;

/// Actor portrait captioned with the actor's name. Grows slightly on hover.
pub fn actor_card<'a>(
    path: &Path,
    name: String,
    hovered: bool,
    card_id: usize,
    fs: f32,
    theme: &Theme,
) -> Element<'a, Message> {
    let surface = surface_color(theme);
    let text_color = theme.palette().text;
    let path_buf = path.to_path_buf();
    let target = if hovered { 1.0_f32 } else { 0.0 };

    let animated: Element<'a, Message> = AnimationBuilder::new(target, move |t: f32| {
        build_card(&path_buf, &name, t.clamp(0.0, 1.0), surface, text_color, fs)
    })
    .animates_layout(true)
    .animation(Easing::EASE_OUT.with_duration(ANIMATION_DURATION))
    .into();

    container(
        mouse_area(animated)
            .on_enter(Message::ActorHover(card_id, true))
            .on_exit(Message::ActorHover(card_id, false)),
    )
    .width(FULL_CARD_WIDTH)
    .center_x(FULL_CARD_WIDTH)
    .into()
}

fn build_card<'a>(
    path: &PathBuf,
    name: &str,
    hover_amount: f32,
    surface: Color,
    text_color: Color,
    fs: f32,
) -> Element<'a, Message> {
    let size = IMG_SIZE + SCALE_GROW * 2.0 * hover_amount;

    let portrait = image(image::Handle::from_path(path))
        .width(size)
        .height(size)
        .border_radius(CORNER_RADIUS - 2.0);

    let caption = text(name.to_owned())
        .size(scaled(18.0, fs))
        .color(text_color)
        .font(iced::Font {
            weight: iced::font::Weight::Bold,
            ..iced::Font::DEFAULT
        })
        .align_x(iced::Alignment::Center)
        .width(Length::Fill);

    container(
        column![portrait, caption]
            .spacing(6)
            .align_x(iced::Alignment::Center),
    )
    .padding(8)
    .width(Length::Fill)
    .style(move |_theme: &Theme| container::Style {
        background: Some(
            Color {
                a: 0.85,
                ..surface
            }
            .into(),
        ),
        border: iced::border::Border {
            radius: CORNER_RADIUS.into(),
            ..iced::border::Border::default()
        },
        ..container::Style::default()
    })
    .into()
}

/// Placeholder shown when an actor image is missing on disk.
pub fn missing_actor<'a>(link: &str, fs: f32, theme: &Theme) -> Element<'a, Message> {
    container(
        text(format!("No image for {link}"))
            .size(scaled(13.0, fs))
            .color(crate::theme::tertiary_color(theme)),
    )
    .width(FULL_CARD_WIDTH)
    .padding(8)
    .into()
}
