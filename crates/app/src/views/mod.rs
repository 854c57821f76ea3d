//! The five panels behind the sidebar, plus pieces they share.

pub mod chat;
pub mod community;
pub mod history;
pub mod journal;
pub mod tips;

use crate::theme::Palette;
use egui::RichText;
use shared::wellness::Message;

/// One chat message, right-aligned for the user and left-aligned for Miro.
pub fn message_bubble(ui: &mut egui::Ui, message: &Message, palette: &Palette) -> egui::Response {
    let from_ai = message.is_from_ai();
    let (fill, text_color) = if from_ai {
        (palette.card, palette.text)
    } else {
        (palette.green_dark, egui::Color32::WHITE)
    };
    let layout = if from_ai {
        egui::Layout::left_to_right(egui::Align::TOP)
    } else {
        egui::Layout::right_to_left(egui::Align::TOP)
    };
    let max_width = (ui.available_width() * 0.7).max(200.0);

    ui.with_layout(layout, |ui| {
        if from_ai {
            ui.label(RichText::new("🌱").size(20.0));
        }
        egui::Frame::none()
            .fill(fill)
            .rounding(if from_ai {
                egui::Rounding {
                    nw: 16.0,
                    ne: 16.0,
                    sw: 2.0,
                    se: 16.0,
                }
            } else {
                egui::Rounding {
                    nw: 16.0,
                    ne: 16.0,
                    sw: 16.0,
                    se: 2.0,
                }
            })
            .inner_margin(egui::Margin::same(12.0))
            .show(ui, |ui| {
                ui.set_max_width(max_width);
                ui.label(RichText::new(&message.text).size(14.0).color(text_color));
            });
    })
    .response
}

/// Heading at the top of a panel.
pub fn panel_title(ui: &mut egui::Ui, title: String, palette: &Palette) {
    ui.heading(RichText::new(title).size(26.0).strong().color(palette.text));
    ui.add_space(8.0);
}
