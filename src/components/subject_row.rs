use cosmic::iced::{Alignment, Length};
use cosmic::widget::{button, icon, row, text, text_input};
use cosmic::{Element, theme};

use studyboard::core::subject::{EditBuffer, SubjectEntry};

use crate::fl;
use crate::message::Message;

const LABEL_WIDTH: f32 = 72.0;

/// One subject line. Shows an input with a save button while `editing` targets this row.
pub fn subject_row<'a>(
    index: usize,
    entry: &'a SubjectEntry,
    editing: Option<&'a EditBuffer>,
) -> Element<'a, Message> {
    let label = text::title4(entry.label.clone()).width(Length::Fixed(LABEL_WIDTH));

    let body: Element<'a, Message> = match editing {
        Some(buffer) if buffer.index == index => row()
            .spacing(8)
            .align_y(Alignment::Center)
            .push(
                text_input::text_input(entry.label.clone(), &buffer.text)
                    .on_input(Message::SubjectInputChanged)
                    .on_submit(move |_| Message::SaveSubject(index))
                    .width(Length::Fill),
            )
            .push(button::suggested(fl!("subject-save")).on_press(Message::SaveSubject(index)))
            .push(
                button::icon(icon::from_name("window-close-symbolic"))
                    .on_press(Message::CancelEdit),
            )
            .into(),
        _ => button::custom(text::title4(entry.task.clone()).width(Length::Fill))
            .class(theme::Button::Text)
            .width(Length::Fill)
            .on_press(Message::EditSubject(index))
            .into(),
    };

    row()
        .spacing(12)
        .align_y(Alignment::Center)
        .push(label)
        .push(body)
        .into()
}
