//! Conversation with Miro.

use super::message_bubble;
use crate::state::AppState;
use crate::theme::Palette;
use crate::types::ConfirmAction;
use egui::RichText;
use services::chat_history::search;

pub fn render(s: &mut AppState, ui: &mut egui::Ui, palette: &Palette) {
    s.refresh_smart_replies();

    ui.horizontal(|ui| {
        ui.heading(RichText::new(s.i18n.t("chat.header")).strong().color(palette.text));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let clear_label = s.i18n.t("chat.clearHistory.button");
            if ui
                .button(RichText::new("🗑").size(16.0))
                .on_hover_text(clear_label)
                .clicked()
            {
                s.confirm.ask(ConfirmAction::ClearChat);
            }
            let hint = s.i18n.t("chat.search.placeholder");
            ui.add(
                egui::TextEdit::singleline(&mut s.chat.search)
                    .hint_text(hint)
                    .desired_width(220.0),
            );
        });
    });
    ui.separator();

    let thinking = s.chat.is_busy();
    let input_height = if s.chat.smart_replies.is_empty() { 64.0 } else { 110.0 };

    egui::ScrollArea::vertical()
        .max_height((ui.available_height() - input_height).max(120.0))
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for message in search(s.chat_history.get(), &s.chat.search) {
                ui.add_space(4.0);
                message_bubble(ui, message, palette);
            }

            if thinking {
                ui.add_space(6.0);
                let time = ui.input(|i| i.time);
                let dots = match ((time * 2.0) as i32) % 4 {
                    0 => "   ",
                    1 => ".  ",
                    2 => ".. ",
                    _ => "...",
                };
                ui.label(
                    RichText::new(format!("{}{}", s.i18n.t("chat.thinking"), dots))
                        .italics()
                        .color(palette.text_light),
                );
                ui.ctx().request_repaint();
            }
        });

    ui.add_space(8.0);

    if !s.chat.smart_replies.is_empty() {
        let mut chosen = None;
        ui.horizontal_wrapped(|ui| {
            for reply in &s.chat.smart_replies {
                let chip = egui::Button::new(RichText::new(reply).color(palette.green_dark))
                    .fill(palette.card)
                    .stroke(egui::Stroke::new(1.0, palette.green))
                    .rounding(egui::Rounding::same(14.0));
                if ui.add(chip).clicked() {
                    chosen = Some(reply.clone());
                }
            }
        });
        if let Some(reply) = chosen {
            s.send_message(&reply);
        }
        ui.add_space(4.0);
    }

    ui.horizontal(|ui| {
        let hint = s.i18n.t("chat.placeholder");
        let response = ui.add_sized(
            [ui.available_width() - 90.0, 40.0],
            egui::TextEdit::singleline(&mut s.chat.input)
                .hint_text(hint)
                .font(egui::FontId::new(15.0, egui::FontFamily::Proportional)),
        );

        let mut send = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

        let can_send = !thinking && !s.chat.input.trim().is_empty();
        let button = egui::Button::new(
            RichText::new(s.i18n.t("chat.send"))
                .strong()
                .color(egui::Color32::WHITE),
        )
        .fill(palette.green_dark)
        .rounding(egui::Rounding::same(20.0));
        if ui.add_enabled(can_send, button).clicked() {
            send = true;
        }

        if send {
            let text = s.chat.input.clone();
            s.send_message(&text);
            response.request_focus();
        }
    });
}
