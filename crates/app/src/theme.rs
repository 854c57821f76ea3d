//! Colors and global style.

use egui::{Color32, Rounding, Stroke};

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub base: Color32,
    pub sidebar: Color32,
    pub card: Color32,
    pub accent: Color32,
    pub accent_dark: Color32,
    pub green: Color32,
    pub green_dark: Color32,
    pub text: Color32,
    pub text_light: Color32,
}

impl Palette {
    pub const LIGHT: Palette = Palette {
        base: Color32::from_rgb(0xFC, 0xFB, 0xF9),
        sidebar: Color32::from_rgb(0xF9, 0xF8, 0xF6),
        card: Color32::WHITE,
        accent: Color32::from_rgb(0xFE, 0xEC, 0xE9),
        accent_dark: Color32::from_rgb(0xF8, 0x71, 0x71),
        green: Color32::from_rgb(0xA3, 0xB8, 0xA2),
        green_dark: Color32::from_rgb(0x6E, 0x8B, 0x6D),
        text: Color32::from_rgb(0x1F, 0x29, 0x37),
        text_light: Color32::from_rgb(0x6B, 0x72, 0x80),
    };

    pub const DARK: Palette = Palette {
        base: Color32::from_rgb(30, 30, 35),
        sidebar: Color32::from_rgb(35, 35, 42),
        card: Color32::from_rgb(45, 45, 55),
        accent: Color32::from_rgb(70, 45, 45),
        accent_dark: Color32::from_rgb(0xF8, 0x71, 0x71),
        green: Color32::from_rgb(0x6E, 0x8B, 0x6D),
        green_dark: Color32::from_rgb(0x5A, 0x75, 0x59),
        text: Color32::from_rgb(220, 220, 230),
        text_light: Color32::from_rgb(160, 160, 180),
    };

    pub fn for_mode(dark: bool) -> Palette {
        if dark {
            Palette::DARK
        } else {
            Palette::LIGHT
        }
    }
}

/// Install the frame's style and return the palette panels draw with.
pub fn apply(ctx: &egui::Context, dark: bool) -> Palette {
    let palette = Palette::for_mode(dark);
    let mut style = (*ctx.style()).clone();
    style.visuals = if dark {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    };
    style.visuals.window_rounding = Rounding::same(16.0);
    style.visuals.panel_fill = palette.base;
    style.visuals.window_fill = palette.card;
    style.visuals.widgets.hovered.bg_stroke = Stroke::new(2.0, palette.green_dark);
    style.visuals.selection.bg_fill = palette.green;
    style.visuals.selection.stroke = Stroke::new(2.0, palette.green_dark);
    style.spacing.item_spacing = egui::vec2(8.0, 8.0);
    ctx.set_style(style);
    palette
}

/// White rounded card used by every panel.
pub fn card(palette: &Palette) -> egui::Frame {
    egui::Frame::none()
        .fill(palette.card)
        .rounding(Rounding::same(16.0))
        .inner_margin(egui::Margin::same(20.0))
}
