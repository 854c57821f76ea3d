//! First-run profile form.
//!
//! The same form backs the edit-profile modal, so validation and the gender
//! picker live here.

use crate::state::AppState;
use crate::theme::{self, Palette};
use services::Localizer;
use shared::wellness::{ProfileError, UserProfile, GENDER_OPTIONS};

/// Raw field contents, validated only on submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub name: String,
    pub age: String,
    pub gender: String,
}

impl ProfileForm {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            name: profile.name.clone(),
            age: profile.age.to_string(),
            gender: profile.gender.clone(),
        }
    }

    pub fn validate(&self) -> Result<UserProfile, ProfileError> {
        UserProfile::from_form(&self.name, &self.age, &self.gender)
    }
}

pub fn gender_label_key(value: &str) -> &'static str {
    match value {
        "female" => "onboarding.gender.female",
        "male" => "onboarding.gender.male",
        "non-binary" => "onboarding.gender.non-binary",
        "other" => "onboarding.gender.other",
        "prefer not to say" => "onboarding.gender.preferNotToSay",
        _ => "onboarding.gender.select",
    }
}

/// Dropdown over the fixed gender options.
pub fn gender_picker(ui: &mut egui::Ui, id: &str, gender: &mut String, i18n: &Localizer) {
    egui::ComboBox::from_id_source(id)
        .width(ui.available_width())
        .selected_text(i18n.t(gender_label_key(gender)))
        .show_ui(ui, |ui| {
            for option in GENDER_OPTIONS {
                let label = i18n.t(gender_label_key(option));
                if ui.selectable_label(gender == option, label).clicked() {
                    *gender = option.to_string();
                }
            }
        });
}

/// Name, age, and gender fields with labels.
pub fn profile_fields(
    ui: &mut egui::Ui,
    id: &str,
    form: &mut ProfileForm,
    labels: [String; 3],
    placeholders: [String; 2],
    i18n: &Localizer,
) {
    let [name_label, age_label, gender_label] = labels;
    let [name_hint, age_hint] = placeholders;

    ui.label(egui::RichText::new(name_label).strong());
    ui.add(
        egui::TextEdit::singleline(&mut form.name)
            .hint_text(name_hint)
            .desired_width(f32::INFINITY),
    );
    ui.add_space(8.0);

    ui.label(egui::RichText::new(age_label).strong());
    ui.add(
        egui::TextEdit::singleline(&mut form.age)
            .hint_text(age_hint)
            .desired_width(f32::INFINITY),
    );
    ui.add_space(8.0);

    ui.label(egui::RichText::new(gender_label).strong());
    gender_picker(ui, id, &mut form.gender, i18n);
}

pub fn render_onboarding_screen(s: &mut AppState, ctx: &egui::Context, palette: &Palette) {
    egui::CentralPanel::default()
        .frame(
            egui::Frame::none()
                .fill(palette.base)
                .inner_margin(egui::Margin::same(40.0)),
        )
        .show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(40.0);
                        ui.label(
                            egui::RichText::new(s.i18n.t("onboarding.welcome"))
                                .size(32.0)
                                .strong()
                                .color(palette.text),
                        );
                        ui.label(
                            egui::RichText::new(s.i18n.t("onboarding.subtitle"))
                                .size(15.0)
                                .color(palette.text_light),
                        );
                        ui.add_space(24.0);
                    });

                    let width = ui.available_width().min(440.0);
                    let margin = (ui.available_width() - width) / 2.0;
                    ui.horizontal(|ui| {
                        ui.add_space(margin);
                        ui.vertical(|ui| {
                            ui.set_width(width);
                            theme::card(palette).show(ui, |ui| {
                                let labels = [
                                    s.i18n.t("onboarding.name.label"),
                                    s.i18n.t("onboarding.age.label"),
                                    s.i18n.t("onboarding.gender.label"),
                                ];
                                let placeholders = [
                                    s.i18n.t("onboarding.name.placeholder"),
                                    s.i18n.t("onboarding.age.placeholder"),
                                ];
                                profile_fields(
                                    ui,
                                    "onboarding_gender",
                                    &mut s.onboarding,
                                    labels,
                                    placeholders,
                                    &s.i18n,
                                );
                                ui.add_space(16.0);

                                let submit = egui::Button::new(
                                    egui::RichText::new(s.i18n.t("onboarding.submit"))
                                        .strong()
                                        .color(egui::Color32::WHITE),
                                )
                                .fill(palette.green_dark)
                                .rounding(egui::Rounding::same(20.0))
                                .min_size(egui::vec2(ui.available_width(), 40.0));

                                let valid = s.onboarding.validate();
                                if ui.add_enabled(valid.is_ok(), submit).clicked() {
                                    if let Ok(profile) = valid {
                                        s.complete_onboarding(profile);
                                    }
                                }
                            });
                        });
                    });
                });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_validation() {
        let mut form = ProfileForm::default();
        assert!(form.validate().is_err());
        form.name = "  Asha ".into();
        form.age = "29".into();
        assert_eq!(form.validate(), Err(ProfileError::MissingGender));
        form.gender = "female".into();
        let profile = form.validate().unwrap();
        assert_eq!(profile.name, "Asha");
        assert_eq!(profile.age, 29);

        form.age = "151".into();
        assert!(form.validate().is_err());
        form.age = "0".into();
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_form_round_trips_profile() {
        let profile = UserProfile {
            name: "Ravi".into(),
            age: 41,
            gender: "prefer not to say".into(),
        };
        let form = ProfileForm::from_profile(&profile);
        assert_eq!(form.validate().unwrap(), profile);
    }

    #[test]
    fn test_every_gender_option_has_a_label() {
        for option in GENDER_OPTIONS {
            assert_ne!(gender_label_key(option), "onboarding.gender.select");
        }
    }
}
