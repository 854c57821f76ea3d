//! Journal entries, positive reflections, and the mood tracker.

use super::panel_title;
use crate::state::AppState;
use crate::theme::{self, Palette};
use chrono::Local;
use egui::{Color32, RichText};
use services::journal::positive_reflections;
use services::mood::{mood_on, week_series, DaySlot};
use shared::wellness::Mood;

const CHART_HEIGHT: f32 = 120.0;

fn mood_color(mood: Mood) -> Color32 {
    let (r, g, b) = mood.color();
    Color32::from_rgb(r, g, b)
}

pub fn render(s: &mut AppState, ui: &mut egui::Ui, palette: &Palette) {
    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            panel_title(ui, s.i18n.t("journal.title"), palette);
            mood_tracker(s, ui, palette);
            ui.add_space(12.0);
            entry_form(s, ui, palette);
            ui.add_space(12.0);
            reflections(s, ui, palette);
        });
}

fn mood_tracker(s: &mut AppState, ui: &mut egui::Ui, palette: &Palette) {
    let today = Local::now().date_naive();
    let todays_mood = mood_on(s.moods.get(), today);

    theme::card(palette).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.label(
            RichText::new(s.i18n.t("journal.mood.today"))
                .size(17.0)
                .strong()
                .color(palette.text),
        );
        ui.add_space(6.0);

        let mut picked = None;
        ui.horizontal_wrapped(|ui| {
            for mood in Mood::ALL {
                let selected = todays_mood == Some(mood);
                let button = egui::Button::new(
                    RichText::new(format!("{}\n{}", mood.emoji(), mood.as_str()))
                        .size(15.0)
                        .color(palette.text),
                )
                .fill(if selected { palette.accent } else { palette.card })
                .stroke(egui::Stroke::new(
                    if selected { 2.0 } else { 1.0 },
                    if selected { palette.accent_dark } else { palette.green },
                ))
                .rounding(egui::Rounding::same(12.0))
                .min_size(egui::vec2(72.0, 56.0));
                if ui.add(button).clicked() {
                    picked = Some(mood);
                }
            }
        });
        if let Some(mood) = picked {
            s.log_mood(mood);
        }

        ui.add_space(12.0);
        ui.label(
            RichText::new(s.i18n.t("journal.mood.weeklyGraph"))
                .strong()
                .color(palette.text),
        );
        let week = week_series(s.moods.get(), today);
        weekly_chart(ui, &week, s, palette);
    });
}

fn weekly_chart(ui: &mut egui::Ui, week: &[DaySlot], s: &AppState, palette: &Palette) {
    let width = ui.available_width();
    let (rect, response) =
        ui.allocate_exact_size(egui::vec2(width, CHART_HEIGHT + 20.0), egui::Sense::hover());
    response.on_hover_text(s.i18n.t("journal.mood.aria.graph"));

    let painter = ui.painter_at(rect);
    let slot_width = rect.width() / week.len().max(1) as f32;
    let bar_width = (slot_width * 0.5).min(36.0);
    let baseline = rect.top() + CHART_HEIGHT;

    for (i, slot) in week.iter().enumerate() {
        let center_x = rect.left() + slot_width * (i as f32 + 0.5);
        let height = (CHART_HEIGHT * slot.height_fraction()).max(2.0);
        let bar = egui::Rect::from_min_max(
            egui::pos2(center_x - bar_width / 2.0, baseline - height),
            egui::pos2(center_x + bar_width / 2.0, baseline),
        );
        let fill = slot.mood.map(mood_color).unwrap_or(palette.text_light);
        painter.rect_filled(bar, egui::Rounding::same(4.0), fill);

        let bar_response = ui.interact(bar.expand(4.0), ui.id().with(("mood_bar", i)), egui::Sense::hover());
        let tip = match slot.mood {
            Some(mood) => s.i18n.t_with("journal.mood.aria.moodLogged", &[("mood", mood.as_str())]),
            None => s.i18n.t("journal.mood.aria.noMoodLogged"),
        };
        bar_response.on_hover_text(tip);

        painter.text(
            egui::pos2(center_x, baseline + 4.0),
            egui::Align2::CENTER_TOP,
            s.i18n.t(slot.weekday_key()),
            egui::FontId::proportional(12.0),
            palette.text_light,
        );
    }
}

fn entry_form(s: &mut AppState, ui: &mut egui::Ui, palette: &Palette) {
    theme::card(palette).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.label(
            RichText::new(s.i18n.t("journal.thoughts.title"))
                .size(17.0)
                .strong()
                .color(palette.text),
        );
        ui.label(
            RichText::new(s.i18n.t("journal.thoughts.subtitle"))
                .small()
                .color(palette.text_light),
        );
        ui.add_space(6.0);

        let hint = s.i18n.t("journal.thoughts.placeholder");
        let saving = s.journal_panel.saving;
        ui.add_enabled(
            !saving,
            egui::TextEdit::multiline(&mut s.journal_panel.draft)
                .hint_text(hint)
                .desired_rows(6)
                .desired_width(f32::INFINITY),
        );
        ui.add_space(6.0);

        let label = if saving {
            s.i18n.t("journal.thoughts.saving")
        } else {
            s.i18n.t("journal.thoughts.save")
        };
        let save = egui::Button::new(RichText::new(label).strong().color(Color32::WHITE))
            .fill(palette.green_dark)
            .rounding(egui::Rounding::same(20.0));
        let can_save = !saving && !s.journal_panel.draft.trim().is_empty();
        if ui.add_enabled(can_save, save).clicked() {
            s.save_journal_entry();
        }
    });
}

fn reflections(s: &AppState, ui: &mut egui::Ui, palette: &Palette) {
    theme::card(palette).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.label(
            RichText::new(s.i18n.t("journal.reflections.title"))
                .size(17.0)
                .strong()
                .color(palette.text),
        );
        ui.add_space(6.0);

        let entries = positive_reflections(s.journal.get());
        if entries.is_empty() {
            ui.label(
                RichText::new(s.i18n.t("journal.reflections.empty"))
                    .italics()
                    .color(palette.text_light),
            );
            return;
        }

        for entry in entries {
            egui::Frame::none()
                .fill(palette.base)
                .rounding(egui::Rounding::same(12.0))
                .inner_margin(egui::Margin::same(12.0))
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    let local = entry.date.with_timezone(&Local);
                    ui.label(
                        RichText::new(local.format("%A, %B %-d, %Y").to_string())
                            .small()
                            .strong()
                            .color(palette.green_dark),
                    );
                    ui.label(RichText::new(&entry.content).color(palette.text));
                });
            ui.add_space(4.0);
        }
    });
}
