//! Yes/no confirmation for destructive actions.

use super::{backdrop, window, Modal, ModalResult};
use crate::types::ConfirmAction;
use egui::{Context, Key, RichText};
use services::Localizer;

#[derive(Debug, Default)]
pub struct ConfirmDialog {
    pending: Option<ConfirmAction>,
}

impl ConfirmDialog {
    pub fn ask(&mut self, action: ConfirmAction) {
        self.pending = Some(action);
    }
}

impl Modal for ConfirmDialog {
    type Output = ConfirmAction;

    fn show(&mut self, ctx: &Context, i18n: &Localizer) -> ModalResult<ConfirmAction> {
        let Some(action) = self.pending.clone() else {
            return ModalResult::Pending;
        };

        backdrop(ctx, "confirm");
        let mut result = ModalResult::Pending;
        window("confirm", i18n.t("modal.confirm.title")).show(ctx, |ui| {
            ui.set_min_width(320.0);
            ui.add_space(4.0);
            ui.label(RichText::new(i18n.t(action.prompt_key())).size(15.0));
            ui.add_space(12.0);
            ui.horizontal(|ui| {
                if ui.button(i18n.t("modal.confirm.cancel")).clicked() {
                    result = ModalResult::Cancelled;
                }
                ui.add_space(8.0);
                let yes = egui::Button::new(
                    RichText::new(i18n.t("modal.confirm.yes")).color(egui::Color32::WHITE),
                )
                .fill(egui::Color32::from_rgb(0xF8, 0x71, 0x71));
                if ui.add(yes).clicked() {
                    result = ModalResult::Confirmed(action.clone());
                }
            });
        });

        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            result = ModalResult::Cancelled;
        }
        if !matches!(result, ModalResult::Pending) {
            self.pending = None;
        }
        result
    }

    fn is_open(&self) -> bool {
        self.pending.is_some()
    }

    fn close(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_opens_and_close_clears() {
        let mut dialog = ConfirmDialog::default();
        assert!(!dialog.is_open());
        dialog.ask(ConfirmAction::DeleteMessage("42".into()));
        assert!(dialog.is_open());
        dialog.close();
        assert!(!dialog.is_open());
    }
}
