use eframe::egui;
use parking_lot::Mutex;
use services::i18n::languages;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

mod modals;
mod onboarding;
mod state;
mod theme;
mod types;
mod utils;
mod views;

use modals::{Modal, ModalResult};
use state::AppState;
use theme::Palette;
use types::View;

fn main() -> eframe::Result<()> {
    utils::init_tracing();

    let settings = utils::load_settings_or_default();
    let storage = utils::open_storage(&settings);
    let (companion, model_error) = utils::build_companion(&settings);
    let locales_dir = utils::locales_dir(&settings);
    let state = match AppState::new(settings, storage, companion, model_error, locales_dir) {
        Ok(state) => state,
        Err(e) => {
            error!("failed to start Miro: {:#}", e);
            std::process::exit(1);
        }
    };
    info!("starting Miro");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([760.0, 560.0]),
        vsync: true,
        ..Default::default()
    };
    eframe::run_native(
        "Miro",
        options,
        Box::new(move |cc| {
            let mut state = state;
            state.attach_context(cc.egui_ctx.clone());
            Box::new(MiroApp {
                state: Arc::new(Mutex::new(state)),
            })
        }),
    )
}

struct MiroApp {
    state: Arc<Mutex<AppState>>,
}

impl eframe::App for MiroApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut s = self.state.lock();

        s.poll_background();
        s.sync_storage();

        let palette = theme::apply(ctx, s.settings.dark_mode);

        // No profile yet: nothing but the form.
        if s.profile.get().is_none() {
            onboarding::render_onboarding_screen(&mut s, ctx, &palette);
            ctx.request_repaint_after(Duration::from_secs(1));
            return;
        }

        render_sidebar(&mut s, ctx, &palette);
        render_header(&mut s, ctx, &palette);

        let view = s.view;
        egui::CentralPanel::default()
            .frame(
                egui::Frame::none()
                    .fill(palette.base)
                    .inner_margin(egui::Margin::same(20.0)),
            )
            .show(ctx, |ui| match view {
                View::Chat => views::chat::render(&mut s, ui, &palette),
                View::Journal => views::journal::render(&mut s, ui, &palette),
                View::Tips => views::tips::render(&mut s, ui, &palette),
                View::Community => views::community::render(&mut s, ui, &palette),
                View::History => views::history::render(&mut s, ui, &palette),
            });

        render_modals(&mut s, ctx);

        if s.is_working() {
            ctx.request_repaint_after(Duration::from_millis(100));
        } else {
            // Keep polling storage for writes from other processes.
            ctx.request_repaint_after(Duration::from_secs(1));
        }
    }
}

fn render_sidebar(s: &mut AppState, ctx: &egui::Context, palette: &Palette) {
    egui::SidePanel::left("sidebar")
        .exact_width(220.0)
        .resizable(false)
        .frame(
            egui::Frame::none()
                .fill(palette.sidebar)
                .inner_margin(egui::Margin::same(16.0)),
        )
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new("🌱 Miro")
                    .size(26.0)
                    .strong()
                    .color(palette.green_dark),
            );
            ui.add_space(16.0);

            for view in View::ALL {
                let selected = s.view == view;
                let label = egui::RichText::new(format!("{}  {}", view.icon(), s.i18n.t(view.label_key())))
                    .size(16.0)
                    .color(if selected { palette.accent_dark } else { palette.text });
                let button = egui::Button::new(label)
                    .fill(if selected { palette.accent } else { egui::Color32::TRANSPARENT })
                    .rounding(egui::Rounding::same(12.0))
                    .min_size(egui::vec2(ui.available_width(), 36.0));
                if ui.add(button).clicked() && !selected {
                    s.enter_view(view);
                }
            }

            ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
                let mut dark = s.settings.dark_mode;
                if ui.checkbox(&mut dark, "🌙").changed() {
                    s.set_dark_mode(dark);
                }

                if let Some(profile) = s.profile.get().clone() {
                    ui.horizontal(|ui| {
                        ui.label(egui::RichText::new(&profile.name).strong().color(palette.text));
                        if ui
                            .small_button("✏")
                            .on_hover_text(s.i18n.t("sidebar.editProfile"))
                            .clicked()
                        {
                            s.edit_profile.open_with(&profile);
                        }
                    });
                }
                ui.add_space(8.0);

                let current = s.language.get().clone();
                let mut chosen = None;
                egui::ComboBox::from_id_source("language")
                    .width(ui.available_width())
                    .selected_text(current.as_str())
                    .show_ui(ui, |ui| {
                        for &(name, _) in languages() {
                            if ui.selectable_label(current == name, name).clicked() {
                                chosen = Some(name);
                            }
                        }
                    });
                ui.label(egui::RichText::new(s.i18n.t("sidebar.language")).small().color(palette.text_light));
                if let Some(name) = chosen {
                    s.set_language(name);
                }
            });
        });
}

fn render_header(s: &mut AppState, ctx: &egui::Context, palette: &Palette) {
    egui::TopBottomPanel::top("header")
        .frame(
            egui::Frame::none()
                .fill(palette.base)
                .inner_margin(egui::Margin::symmetric(20.0, 12.0)),
        )
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                let name = s.profile_name().unwrap_or_default().to_string();
                ui.label(
                    egui::RichText::new(s.i18n.t_with("sidebar.hello", &[("name", name.as_str())]))
                        .size(20.0)
                        .strong()
                        .color(palette.text),
                );

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let emergency = egui::Button::new(
                        egui::RichText::new(format!("☎ {}", s.i18n.t("sidebar.emergency")))
                            .strong()
                            .color(egui::Color32::WHITE),
                    )
                    .fill(palette.accent_dark)
                    .rounding(egui::Rounding::same(20.0));
                    if ui.add(emergency).clicked() {
                        s.emergency.open();
                    }

                    if let Some(reason) = &s.model_error {
                        ui.label(
                            egui::RichText::new(format!("⚠ {}", s.i18n.t("sidebar.offline")))
                                .small()
                                .color(egui::Color32::from_rgb(220, 140, 60)),
                        )
                        .on_hover_text(reason.as_str());
                    }
                });
            });
        });
}

fn render_modals(s: &mut AppState, ctx: &egui::Context) {
    let AppState {
        emergency,
        edit_profile,
        confirm,
        i18n,
        ..
    } = &mut *s;

    // Only one modal at a time; the helplines win.
    if emergency.is_open() {
        emergency.show(ctx, i18n);
        return;
    }

    if edit_profile.is_open() {
        if let ModalResult::Confirmed(profile) = edit_profile.show(ctx, i18n) {
            s.apply_profile_update(profile);
        }
        return;
    }

    if confirm.is_open() {
        if let ModalResult::Confirmed(action) = confirm.show(ctx, i18n) {
            s.confirm_action(action);
        }
    }
}
