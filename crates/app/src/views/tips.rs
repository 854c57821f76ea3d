//! Daily affirmation and wellness tip.

use super::panel_title;
use crate::state::AppState;
use crate::theme::{self, Palette};
use egui::{Color32, RichText};

pub fn render(s: &mut AppState, ui: &mut egui::Ui, palette: &Palette) {
    s.load_tips_if_needed();

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            panel_title(ui, s.i18n.t("tips.title"), palette);

            let affirmation = Card {
                title: s.i18n.t("tips.affirmation.title"),
                loading_text: s.i18n.t("tips.affirmation.loading"),
                button: s.i18n.t("tips.affirmation.new"),
                body: s.tips.affirmation.clone(),
                loading: s.tips.loading_affirmation,
                fill: palette.accent,
                italic: true,
            };
            if affirmation.show(ui, palette) {
                s.refresh_affirmation();
            }

            ui.add_space(12.0);

            let tip = Card {
                title: s.i18n.t("tips.wellness.title"),
                loading_text: s.i18n.t("tips.wellness.loading"),
                button: s.i18n.t("tips.wellness.new"),
                body: s.tips.tip.clone(),
                loading: s.tips.loading_tip,
                fill: palette.card,
                italic: false,
            };
            if tip.show(ui, palette) {
                s.refresh_tip();
            }
        });
}

struct Card {
    title: String,
    loading_text: String,
    button: String,
    body: Option<String>,
    loading: bool,
    fill: Color32,
    italic: bool,
}

impl Card {
    /// Returns true when the refresh button was clicked.
    fn show(self, ui: &mut egui::Ui, palette: &Palette) -> bool {
        let mut clicked = false;
        theme::card(palette).fill(self.fill).show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(
                RichText::new(self.title)
                    .size(18.0)
                    .strong()
                    .color(palette.text),
            );
            ui.add_space(8.0);

            match (&self.body, self.loading) {
                (Some(body), false) => {
                    let mut text = RichText::new(body).size(16.0).color(palette.text);
                    if self.italic {
                        text = text.italics();
                    }
                    ui.label(text);
                }
                _ => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(RichText::new(self.loading_text).color(palette.text_light));
                    });
                }
            }

            ui.add_space(8.0);
            let button = egui::Button::new(RichText::new(self.button).color(Color32::WHITE))
                .fill(palette.green_dark)
                .rounding(egui::Rounding::same(20.0));
            if ui.add_enabled(!self.loading, button).clicked() {
                clicked = true;
            }
        });
        clicked
    }
}
