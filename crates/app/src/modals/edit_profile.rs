//! Edit the name, age, and gender given at onboarding.

use super::{backdrop, window, Modal, ModalResult};
use crate::onboarding::{profile_fields, ProfileForm};
use egui::{Context, Key, RichText};
use services::Localizer;
use shared::wellness::UserProfile;

#[derive(Debug, Default)]
pub struct EditProfileModal {
    is_open: bool,
    form: ProfileForm,
}

impl EditProfileModal {
    /// Open prefilled with `profile`.
    pub fn open_with(&mut self, profile: &UserProfile) {
        self.form = ProfileForm::from_profile(profile);
        self.is_open = true;
    }
}

impl Modal for EditProfileModal {
    type Output = UserProfile;

    fn show(&mut self, ctx: &Context, i18n: &Localizer) -> ModalResult<UserProfile> {
        if !self.is_open {
            return ModalResult::Pending;
        }

        backdrop(ctx, "edit_profile");
        let mut result = ModalResult::Pending;
        let form = &mut self.form;
        window("edit_profile", i18n.t("modal.editProfile.title")).show(ctx, |ui| {
            ui.set_min_width(360.0);
            let labels = [
                i18n.t("modal.editProfile.name"),
                i18n.t("modal.editProfile.age"),
                i18n.t("modal.editProfile.gender"),
            ];
            let placeholders = [
                i18n.t("onboarding.name.placeholder"),
                i18n.t("onboarding.age.placeholder"),
            ];
            profile_fields(ui, "edit_profile_gender", form, labels, placeholders, i18n);
            ui.add_space(16.0);

            ui.horizontal(|ui| {
                if ui.button(i18n.t("modal.editProfile.cancel")).clicked() {
                    result = ModalResult::Cancelled;
                }
                ui.add_space(8.0);
                let validated = form.validate();
                let save = egui::Button::new(
                    RichText::new(i18n.t("modal.editProfile.save")).color(egui::Color32::WHITE),
                )
                .fill(egui::Color32::from_rgb(0x6E, 0x8B, 0x6D));
                if ui.add_enabled(validated.is_ok(), save).clicked() {
                    if let Ok(profile) = validated {
                        result = ModalResult::Confirmed(profile);
                    }
                }
            });
        });

        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            result = ModalResult::Cancelled;
        }
        if !matches!(result, ModalResult::Pending) {
            self.close();
        }
        result
    }

    fn is_open(&self) -> bool {
        self.is_open
    }

    fn close(&mut self) {
        self.is_open = false;
        self.form = ProfileForm::default();
    }
}
