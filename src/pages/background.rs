use cosmic::iced::{Alignment, Length};
use cosmic::widget::{button, column, icon, row, text};
use cosmic::Element;

use studyboard::core::background::{BackgroundMode, BackgroundSettings};

use crate::fl;
use crate::message::Message;

fn mode_label(mode: BackgroundMode) -> String {
    match mode {
        BackgroundMode::Default => fl!("background-default"),
        BackgroundMode::DailyRemote => fl!("background-daily"),
        BackgroundMode::Custom => fl!("background-custom"),
    }
}

/// Context drawer content: mode choice, daily refresh, custom upload and logging.
///
/// Mode and refresh controls are inert while `loading`.
pub fn background_panel<'a>(
    settings: &'a BackgroundSettings,
    loading: bool,
    upload_error: Option<&'a str>,
    debug_logging: bool,
) -> Element<'a, Message> {
    let mut content = column().spacing(12).padding(16);

    for &mode in BackgroundMode::ALL {
        let label = mode_label(mode);
        let on_press = (!loading).then_some(Message::SelectBackground(mode));
        let btn = if settings.mode == mode {
            button::suggested(label)
        } else {
            button::standard(label)
        };
        content = content.push(btn.on_press_maybe(on_press).width(Length::Fill));
    }

    // --- Daily image ---
    if settings.mode == BackgroundMode::DailyRemote {
        let refresh_label = if loading {
            fl!("background-refreshing")
        } else {
            fl!("background-refresh")
        };
        content = content.push(
            row()
                .spacing(8)
                .align_y(Alignment::Center)
                .push(text::caption(fl!("background-daily-hint")).width(Length::Fill))
                .push(
                    button::standard(refresh_label)
                        .on_press_maybe((!loading).then_some(Message::RefreshDailyImage)),
                ),
        );
    }

    // --- Custom image ---
    if settings.mode == BackgroundMode::Custom {
        content = content.push(
            row()
                .spacing(8)
                .align_y(Alignment::Center)
                .push(text::caption(fl!("background-upload-hint")).width(Length::Fill))
                .push(
                    button::standard(fl!("background-upload"))
                        .on_press_maybe((!loading).then_some(Message::PickCustomImage)),
                ),
        );
    }

    if let Some(err) = upload_error {
        content = content.push(
            row()
                .spacing(8)
                .align_y(Alignment::Center)
                .push(text::body(err).width(Length::Fill))
                .push(
                    button::icon(icon::from_name("window-close-symbolic"))
                        .on_press(Message::DismissUploadError),
                ),
        );
    }

    // --- Debug logging ---
    content = content.push(
        row()
            .spacing(8)
            .align_y(Alignment::Center)
            .push(text::body(fl!("settings-debug-logging")).width(Length::Fill))
            .push(
                cosmic::widget::toggler(debug_logging).on_toggle(|_| Message::ToggleDebugLogging),
            ),
    );

    content.into()
}
