//! Anonymous community stories.

use super::panel_title;
use crate::state::AppState;
use crate::theme::{self, Palette};
use egui::RichText;

pub fn render(s: &mut AppState, ui: &mut egui::Ui, palette: &Palette) {
    s.load_community_if_needed();

    ui.horizontal(|ui| {
        panel_title(ui, s.i18n.t("community.title"), palette);
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let label = if s.community.is_loading() {
                s.i18n.t("community.refreshing")
            } else {
                s.i18n.t("community.refresh")
            };
            if ui
                .add_enabled(!s.community.is_loading(), egui::Button::new(label))
                .clicked()
            {
                s.refresh_community();
            }
        });
    });

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            if s.community.posts.is_empty() {
                let key = if s.community.is_loading() {
                    "community.loading"
                } else {
                    "community.empty"
                };
                ui.vertical_centered(|ui| {
                    ui.add_space(24.0);
                    if s.community.is_loading() {
                        ui.spinner();
                    }
                    ui.label(RichText::new(s.i18n.t(key)).color(palette.text_light));
                });
                return;
            }

            for post in &s.community.posts {
                theme::card(palette).show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.label(
                        RichText::new(format!("@{}", post.username))
                            .strong()
                            .color(palette.green_dark),
                    );
                    ui.label(RichText::new(&post.content).color(palette.text));
                });
                ui.add_space(8.0);
            }
        });
}
