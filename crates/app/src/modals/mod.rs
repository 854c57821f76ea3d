//! Modal dialogs for the application.
//!
//! Each modal draws itself over a dimmed backdrop and reports the user's
//! decision through [`ModalResult`].

pub mod confirm;
pub mod edit_profile;
pub mod emergency;

pub use confirm::ConfirmDialog;
pub use edit_profile::EditProfileModal;
pub use emergency::EmergencyModal;

use egui::Context;
use services::Localizer;

/// Trait for modal dialogs.
pub trait Modal {
    type Output;

    /// Render the modal if open. Returns the user's decision once made; the
    /// modal closes itself on anything but `Pending`.
    fn show(&mut self, ctx: &Context, i18n: &Localizer) -> ModalResult<Self::Output>;

    /// Returns true if the modal is currently open.
    fn is_open(&self) -> bool;

    /// Close the modal without a decision.
    fn close(&mut self);
}

/// Result from a modal dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum ModalResult<T> {
    /// User hasn't made a decision yet
    Pending,
    /// User confirmed/submitted
    Confirmed(T),
    /// User cancelled
    Cancelled,
}

/// Dim everything behind a modal and swallow clicks on it.
pub(crate) fn backdrop(ctx: &Context, id: &str) {
    egui::Area::new(egui::Id::new(id).with("overlay"))
        .anchor(egui::Align2::LEFT_TOP, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            let screen_rect = ctx.screen_rect();
            ui.allocate_response(screen_rect.size(), egui::Sense::click());
            ui.painter()
                .rect_filled(screen_rect, 0.0, egui::Color32::from_black_alpha(120));
        });
}

/// Centered, fixed window shared by all modals.
pub(crate) fn window(id: &str, title: String) -> egui::Window<'static> {
    egui::Window::new(title)
        .id(egui::Id::new(id).with("window"))
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
}
