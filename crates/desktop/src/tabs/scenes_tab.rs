use iced::widget::{button, column, container, image, row, scrollable, slider, text, Space};
use iced::{Color, Element, Length, Padding, Theme};

use cinescope_core::scenes::domain::scene::Scene;

use crate::app::{scaled, App, Message};
use crate::browser::TIME_STEP;
use crate::theme::{muted_color, surface_color, tertiary_color};
use crate::widgets::actor_card::{actor_card, missing_actor};
use crate::widgets::scene_card::scene_card;

const ACTORS_PER_ROW: usize = 3;

pub fn view<'a>(app: &'a App, theme: &Theme) -> Element<'a, Message> {
    let fs = app.settings.font_scale;

    let title = text(format!("\u{1F3AC} {}", app.settings.movie_title))
        .size(scaled(26.0, fs))
        .font(bold());

    let title: Element<'a, Message> = match &app.banner_notice {
        Some(notice) => column![
            title,
            text(notice.clone())
                .size(scaled(12.0, fs))
                .color(tertiary_color(theme)),
        ]
        .spacing(4)
        .into(),
        None => title.into(),
    };

    if app.browser.is_empty() {
        return column![title, Space::new().height(24), empty_state(app, theme)].into();
    }

    let main = row![
        container(player_column(app, theme)).width(Length::FillPortion(2)),
        container(scene_details(app, theme)).width(Length::FillPortion(1)),
    ]
    .spacing(24);

    column![
        title,
        Space::new().height(16),
        main,
        Space::new().height(20),
        text("Scenes").size(scaled(20.0, fs)).font(bold()),
        Space::new().height(8),
        scene_strip(app, theme),
    ]
    .into()
}

fn empty_state<'a>(app: &'a App, theme: &Theme) -> Element<'a, Message> {
    let fs = app.settings.font_scale;
    let danger = theme.palette().danger;

    let mut col = column![].spacing(12).align_x(iced::Alignment::Center);
    if let Some(error) = &app.load_error {
        col = col.push(
            container(text(error.clone()).size(scaled(14.0, fs)).color(Color::WHITE))
                .padding([10, 16])
                .width(Length::Fill)
                .style(move |_theme: &Theme| container::Style {
                    background: Some(Color { a: 0.8, ..danger }.into()),
                    border: iced::border::Border {
                        radius: 8.0.into(),
                        ..iced::border::Border::default()
                    },
                    ..container::Style::default()
                }),
        );
    }

    col = col
        .push(Space::new().height(24))
        .push(text("No scenes to show").size(scaled(18.0, fs)))
        .push(
            text(app.scenes_path.display().to_string())
                .size(scaled(13.0, fs))
                .color(tertiary_color(theme)),
        )
        .push(Space::new().height(8))
        .push(
            button(text("Choose Scenes File\u{2026}").size(scaled(14.0, fs)))
                .on_press(Message::ChooseScenesFile)
                .padding([10, 24]),
        );

    container(col).width(Length::Fill).center_x(Length::Fill).into()
}

fn player_column<'a>(app: &'a App, theme: &Theme) -> Element<'a, Message> {
    let fs = app.settings.font_scale;
    let current = app.browser.current_time();
    let max_time = app.browser.max_time();

    let preview: Element<'a, Message> = if !app.video_exists {
        warning_box(
            format!("Video file not found: {}", app.video_path.display()),
            fs,
            theme,
        )
    } else if let Some(handle) = &app.preview {
        image(handle.clone()).width(Length::Fill).into()
    } else if let Some(error) = &app.preview_error {
        warning_box(format!("Cannot show this frame: {error}"), fs, theme)
    } else {
        container(
            text("Loading preview\u{2026}")
                .size(scaled(14.0, fs))
                .color(tertiary_color(theme)),
        )
        .center_x(Length::Fill)
        .center_y(240)
        .into()
    };

    let open_button = button(text("Open in Player").size(scaled(13.0, fs)))
        .padding([6, 14])
        .style(button::secondary)
        .on_press_maybe(app.video_exists.then_some(Message::OpenInPlayer));

    let mut col = column![preview, Space::new().height(8), open_button]
        .spacing(0)
        .width(Length::Fill);

    if max_time > 0.0 {
        col = col.push(Space::new().height(16)).push(
            row![
                text("Time (s):").size(scaled(14.0, fs)),
                slider(0.0..=max_time, current, Message::TimeChanged).step(TIME_STEP),
                text(format!("{current:.2}")).size(scaled(14.0, fs)),
            ]
            .spacing(12)
            .align_y(iced::Alignment::Center),
        );
    }

    col.push(Space::new().height(12))
        .push(
            row![
                button(text("\u{23EE} Previous Scene").size(scaled(14.0, fs)))
                    .on_press(Message::PreviousScene)
                    .padding([8, 16])
                    .width(Length::Fill)
                    .style(button::secondary),
                button(text("Next Scene \u{23ED}").size(scaled(14.0, fs)))
                    .on_press(Message::NextScene)
                    .padding([8, 16])
                    .width(Length::Fill)
                    .style(button::secondary),
            ]
            .spacing(12),
        )
        .into()
}

fn scene_details<'a>(app: &'a App, theme: &Theme) -> Element<'a, Message> {
    let fs = app.settings.font_scale;
    let muted = muted_color(theme);

    let Some(scene) = app.browser.current_scene() else {
        return text("No data for the current scene.")
            .size(scaled(14.0, fs))
            .into();
    };

    let movie_toggle = button(
        text(if app.show_movie_description {
            "\u{25BE} About the Movie"
        } else {
            "\u{25B8} About the Movie"
        })
        .size(scaled(15.0, fs)),
    )
    .on_press(Message::ToggleMovieDescription)
    .padding([6, 0])
    .style(button::text);

    let mut col = column![
        text(format!("Scene {} of {}", scene.label(), app.browser.len()))
            .size(scaled(22.0, fs))
            .font(bold()),
        labeled("Description", scene.description.clone(), fs),
        labeled("Time", format!("{} \u{2013} {} s", scene.start, scene.end), fs),
        Space::new().height(4),
        text("Actors in Scene").size(scaled(18.0, fs)).font(bold()),
        actor_grid(app, scene, theme),
        Space::new().height(8),
        movie_toggle,
    ]
    .spacing(8)
    .width(Length::Fill);

    if app.show_movie_description {
        col = col.push(
            text(app.settings.movie_description.clone())
                .size(scaled(14.0, fs))
                .color(muted),
        );
    }

    container(col)
        .padding(16)
        .width(Length::Fill)
        .style(panel_style(surface_color(theme)))
        .into()
}

fn actor_grid<'a>(app: &'a App, scene: &Scene, theme: &Theme) -> Element<'a, Message> {
    let fs = app.settings.font_scale;
    let actors = scene.actor_images(&app.data_dir);
    if actors.is_empty() {
        return text("No actor data.")
            .size(scaled(14.0, fs))
            .color(tertiary_color(theme))
            .into();
    }

    let rows = actors.chunks(ACTORS_PER_ROW).enumerate().map(|(r, chunk)| {
        let cards = chunk.iter().enumerate().map(|(c, (link, path))| {
            let id = r * ACTORS_PER_ROW + c;
            if path.is_file() {
                actor_card(
                    path,
                    Scene::actor_name(link),
                    app.hovered_actor == Some(id),
                    id,
                    fs,
                    theme,
                )
            } else {
                missing_actor(link, fs, theme)
            }
        });
        row(cards).spacing(8).into()
    });

    column(rows).spacing(8).into()
}

fn scene_strip<'a>(app: &'a App, theme: &Theme) -> Element<'a, Message> {
    let fs = app.settings.font_scale;
    let active = app.browser.active_index();

    let cards = app
        .browser
        .scenes()
        .iter()
        .enumerate()
        .map(|(i, scene)| scene_card(scene, &app.data_dir, active == Some(i), fs, theme));

    let strip = row(cards).spacing(6).padding(Padding {
        bottom: 12.0,
        ..Padding::ZERO
    });

    scrollable(strip)
        .direction(scrollable::Direction::Horizontal(
            scrollable::Scrollbar::new(),
        ))
        .width(Length::Fill)
        .into()
}

fn labeled<'a>(label: &str, value: String, fs: f32) -> Element<'a, Message> {
    row![
        text(format!("{label}:")).size(scaled(16.0, fs)).font(bold()),
        text(value).size(scaled(16.0, fs)),
    ]
    .spacing(6)
    .wrap()
    .into()
}

fn warning_box<'a>(message: String, fs: f32, theme: &Theme) -> Element<'a, Message> {
    let warning = theme.palette().warning;
    container(text(message).size(scaled(14.0, fs)))
        .padding([12, 16])
        .width(Length::Fill)
        .style(move |_theme: &Theme| container::Style {
            background: Some(Color { a: 0.2, ..warning }.into()),
            border: iced::border::Border {
                color: warning,
                width: 1.0,
                radius: 8.0.into(),
            },
            ..container::Style::default()
        })
        .into()
}

fn panel_style(surface: Color) -> impl Fn(&Theme) -> container::Style {
    move |_theme: &Theme| container::Style {
        background: Some(Color { a: 0.55, ..surface }.into()),
        border: iced::border::Border {
            radius: 12.0.into(),
            ..iced::border::Border::default()
        },
        ..container::Style::default()
    }
}

fn bold() -> iced::Font {
    iced::Font {
        weight: iced::font::Weight::Bold,
        ..iced::Font::DEFAULT
    }
}
