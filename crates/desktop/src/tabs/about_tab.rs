use iced::widget::{column, text, Space};
use iced::Element;

use crate::app::{scaled, Message};

pub fn view(fs: f32) -> Element<'static, Message> {
    let version = env!("CARGO_PKG_VERSION");

    column![
        text("Cinescope").size(scaled(22.0, fs)),
        Space::new().height(4),
        text(format!("Version {version}")).size(scaled(13.0, fs)),
        Space::new().height(12),
        text(
            "Browse a movie scene by scene: scrub the timeline, jump between \
             scenes and see which actors appear in each one."
        )
        .size(scaled(13.0, fs)),
        Space::new().height(16),
        text("Preparing data").size(scaled(16.0, fs)),
        Space::new().height(8),
        text(
            "cinescope convert-scenes   turn an index-keyed scene map into a list\n\
             cinescope train            build the actor classifier from labeled photos\n\
             cinescope tag              tag the faces seen in every scene"
        )
        .size(scaled(13.0, fs))
        .font(iced::Font::MONOSPACE),
        Space::new().height(16),
        text(
            "Everything runs locally. The only network access is a one-time \
             download of the face models by the command-line tools."
        )
        .size(scaled(13.0, fs)),
    ]
    .spacing(0)
    .into()
}
