use cosmic::iced::{Alignment, Length};
use cosmic::widget::{button, column, icon, row, text, text_input};
use cosmic::{Element, theme};

use studyboard::core::quote::{MAX_INTERVAL_SECS, MIN_INTERVAL_SECS, QuoteState};

use crate::fl;
use crate::message::Message;

/// Quote line, optionally followed by the refresh interval editor.
pub fn quote_bar<'a>(
    quote: &'a QuoteState,
    show_settings: bool,
    interval_input: &'a str,
) -> Element<'a, Message> {
    let line = if quote.attribution.is_empty() {
        quote.text.clone()
    } else {
        format!("{} —— {}", quote.text, quote.attribution)
    };

    // Dimmed while a fetch is in flight.
    let quote_text = if quote.loading {
        text::caption(line).width(Length::Fill)
    } else {
        text::body(line).width(Length::Fill)
    };

    let mut content = column().spacing(8).push(
        row()
            .spacing(8)
            .align_y(Alignment::Center)
            .push(quote_text)
            .push(
                button::icon(icon::from_name("preferences-system-time-symbolic"))
                    .class(theme::Button::Text)
                    .on_press(Message::ToggleQuoteSettings),
            ),
    );

    if show_settings {
        content = content.push(
            row()
                .spacing(8)
                .align_y(Alignment::Center)
                .push(text::caption(fl!(
                    "quote-interval",
                    min = MIN_INTERVAL_SECS,
                    max = MAX_INTERVAL_SECS
                )))
                .push(
                    text_input::text_input("60", interval_input)
                        .on_input(Message::QuoteIntervalInput)
                        .width(Length::Fixed(96.0)),
                ),
        );
    }

    content.into()
}
