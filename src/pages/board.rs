use cosmic::iced::widget::image::Handle;
use cosmic::iced::widget::{Stack, container as iced_container};
use cosmic::iced::{Background, Color, ContentFit, Length};
use cosmic::widget::{column, container, scrollable, text};
use cosmic::{Element, theme};

use studyboard::core::quote::QuoteState;
use studyboard::core::subject::SubjectBoard;
use studyboard::core::transition::Notice;

use crate::components::{quote_bar::quote_bar, subject_row::subject_row};
use crate::fl;
use crate::message::Message;

/// Everything the board view reads from the application.
pub struct BoardCtx<'a> {
    pub heading: &'a str,
    pub image: Option<&'a Handle>,
    pub opacity: f32,
    pub loading: bool,
    pub notice: Option<Notice>,
    pub upload_error: Option<&'a str>,
    pub subjects: &'a SubjectBoard,
    pub quote: &'a QuoteState,
    pub show_quote_settings: bool,
    pub interval_input: &'a str,
}

fn shade(_theme: &cosmic::Theme) -> iced_container::Style {
    iced_container::Style {
        background: Some(Background::Color(Color::from_rgba(0.0, 0.0, 0.0, 0.45))),
        text_color: Some(Color::WHITE),
        ..Default::default()
    }
}

pub fn board_view(ctx: BoardCtx<'_>) -> Element<'_, Message> {
    let mut content = column()
        .spacing(16)
        .padding(32)
        .push(text::title1(ctx.heading));

    let editing = ctx.subjects.editing();
    for (index, entry) in ctx.subjects.entries().iter().enumerate() {
        content = content.push(subject_row(index, entry, editing));
    }

    content = content.push(quote_bar(ctx.quote, ctx.show_quote_settings, ctx.interval_input));

    if ctx.loading {
        content = content.push(text::caption(fl!("background-loading")));
    }
    if let Some(Notice::FellBackToDefault) = ctx.notice {
        content = content.push(text::body(fl!("background-fallback-notice")));
    }
    if let Some(err) = ctx.upload_error {
        content = content.push(text::body(err));
    }

    let foreground = container(scrollable(content))
        .width(Length::Fill)
        .height(Length::Fill)
        .class(theme::Container::custom(shade));

    let mut layers: Vec<Element<'_, Message>> = Vec::with_capacity(2);
    if let Some(handle) = ctx.image {
        layers.push(
            cosmic::iced::widget::image(handle.clone())
                .width(Length::Fill)
                .height(Length::Fill)
                .content_fit(ContentFit::Cover)
                .opacity(ctx.opacity)
                .into(),
        );
    }
    layers.push(foreground.into());

    Stack::with_children(layers)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}
