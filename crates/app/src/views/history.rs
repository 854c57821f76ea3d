//! The full message log, with per-message delete.

use super::{message_bubble, panel_title};
use crate::state::AppState;
use crate::theme::{self, Palette};
use crate::types::ConfirmAction;
use egui::{Color32, RichText};

pub fn render(s: &mut AppState, ui: &mut egui::Ui, palette: &Palette) {
    let is_empty = s.chat_history.get().is_empty();

    ui.horizontal(|ui| {
        panel_title(ui, s.i18n.t("nav.history"), palette);
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let clear = egui::Button::new(
                RichText::new(format!("🗑 {}", s.i18n.t("chat.clearHistory.button")))
                    .color(Color32::WHITE),
            )
            .fill(palette.accent_dark)
            .rounding(egui::Rounding::same(20.0));
            if ui.add_enabled(!is_empty, clear).clicked() {
                s.confirm.ask(ConfirmAction::ClearHistory);
            }
        });
    });

    let delete_label = s.i18n.t("chat.deleteMessage.button");
    let mut doomed = None;
    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            theme::card(palette).show(ui, |ui| {
                ui.set_width(ui.available_width());
                if is_empty {
                    ui.vertical_centered(|ui| {
                        ui.label(RichText::new(s.i18n.t("history.empty")).color(palette.text_light));
                    });
                    return;
                }
                for message in s.chat_history.get() {
                    ui.horizontal(|ui| {
                        let delete = ui
                            .small_button("🗑")
                            .on_hover_text(delete_label.as_str());
                        if delete.clicked() {
                            doomed = Some(message.id.clone());
                        }
                        ui.vertical(|ui| {
                            message_bubble(ui, message, palette);
                        });
                    });
                    ui.add_space(4.0);
                }
            });
        });

    if let Some(id) = doomed {
        s.confirm.ask(ConfirmAction::DeleteMessage(id));
    }
}
