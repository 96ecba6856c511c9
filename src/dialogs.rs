//! Confirmation and notice dialogs, shown one at a time

use std::collections::VecDeque;

use egui::{Align2, Id};

use crate::actions::Action;

#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    /// Yes runs `on_yes`, No does nothing
    Confirm {
        title: String,
        message: String,
        on_yes: Action,
    },
    Notice { title: String, message: String },
}

impl Dialog {
    fn title(&self) -> &str {
        match self {
            Self::Confirm { title, .. } | Self::Notice { title, .. } => title,
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Confirm { message, .. } | Self::Notice { message, .. } => message,
        }
    }
}

#[derive(Default)]
pub struct Dialogs {
    queue: VecDeque<Dialog>,
}

impl Dialogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirm(&mut self, message: impl Into<String>, on_yes: Action) {
        self.queue.push_back(Dialog::Confirm {
            title: "Confirm delete".to_string(),
            message: message.into(),
            on_yes,
        });
    }

    /// Queue a message for the user. Also logged as a warning.
    pub fn notice(&mut self, title: impl Into<String>, message: impl Into<String>) {
        let (title, message) = (title.into(), message.into());
        log::warn!("{}: {}", title, message);
        self.queue.push_back(Dialog::Notice { title, message });
    }

    pub fn current(&self) -> Option<&Dialog> {
        self.queue.front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Close the current dialog. Returns the action a confirmed dialog carries.
    pub fn answer(&mut self, yes: bool) -> Option<Action> {
        match self.queue.pop_front()? {
            Dialog::Confirm { on_yes, .. } if yes => Some(on_yes),
            _ => None,
        }
    }

    pub fn show(&mut self, ctx: &egui::Context) -> Option<Action> {
        let dialog = self.queue.front()?;
        let mut answer = None;

        egui::Window::new(dialog.title())
            .id(Id::new("deskpet-dialog"))
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(dialog.message());
                ui.add_space(8.0);
                ui.horizontal(|ui| match dialog {
                    Dialog::Confirm { .. } => {
                        if ui.button("Yes").clicked() {
                            answer = Some(true);
                        }
                        if ui.button("No").clicked() {
                            answer = Some(false);
                        }
                    }
                    Dialog::Notice { .. } => {
                        if ui.button("OK").clicked() {
                            answer = Some(false);
                        }
                    }
                });
            });

        answer.and_then(|yes| self.answer(yes))
    }
}
