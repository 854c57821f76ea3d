//! Crisis helplines.

use super::{backdrop, window, Modal, ModalResult};
use egui::{Context, Key, RichText};
use services::Localizer;
use shared::wellness::{Helpline, HELPLINES};
use tracing::{error, info};

#[derive(Debug, Default)]
pub struct EmergencyModal {
    is_open: bool,
}

impl EmergencyModal {
    pub fn open(&mut self) {
        self.is_open = true;
    }
}

/// `tel:` URI for a helpline, without spaces.
pub fn dial_uri(helpline: &Helpline) -> String {
    let digits: String = helpline.number.chars().filter(|c| !c.is_whitespace()).collect();
    format!("tel:{}", digits)
}

fn dial(helpline: &Helpline) {
    let uri = dial_uri(helpline);
    info!(helpline = helpline.name, "opening dialer");
    if let Err(e) = open::that(&uri) {
        error!("failed to open {}: {}", uri, e);
    }
}

impl Modal for EmergencyModal {
    type Output = ();

    fn show(&mut self, ctx: &Context, i18n: &Localizer) -> ModalResult<()> {
        if !self.is_open {
            return ModalResult::Pending;
        }

        backdrop(ctx, "emergency");
        let accent = egui::Color32::from_rgb(0xF8, 0x71, 0x71);
        let mut result = ModalResult::Pending;
        window("emergency", i18n.t("modal.emergency.title")).show(ctx, |ui| {
            ui.set_max_width(460.0);
            ui.label(RichText::new(i18n.t("modal.emergency.subtitle")).weak());
            ui.add_space(12.0);

            for helpline in &HELPLINES {
                egui::Frame::none()
                    .fill(egui::Color32::from_rgb(0xFE, 0xEC, 0xE9))
                    .rounding(egui::Rounding::same(12.0))
                    .inner_margin(egui::Margin::same(12.0))
                    .show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        ui.label(
                            RichText::new(helpline.name)
                                .strong()
                                .color(egui::Color32::from_rgb(0x1F, 0x29, 0x37)),
                        );
                        ui.label(
                            RichText::new(helpline.description)
                                .small()
                                .color(egui::Color32::from_rgb(0x6B, 0x72, 0x80)),
                        );
                        let number = ui.add(
                            egui::Link::new(RichText::new(helpline.number).strong().color(accent)),
                        );
                        if number.on_hover_text(dial_uri(helpline)).clicked() {
                            dial(helpline);
                        }
                    });
                ui.add_space(6.0);
            }

            ui.add_space(8.0);
            ui.vertical_centered(|ui| {
                if ui.button(i18n.t("modal.emergency.close")).clicked() {
                    result = ModalResult::Cancelled;
                }
            });
        });

        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            result = ModalResult::Cancelled;
        }
        if !matches!(result, ModalResult::Pending) {
            self.is_open = false;
        }
        result
    }

    fn is_open(&self) -> bool {
        self.is_open
    }

    fn close(&mut self) {
        self.is_open = false;
    }
}
