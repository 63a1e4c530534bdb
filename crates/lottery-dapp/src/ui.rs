//! UI helper components

use eframe::egui;
use lottery_sync_core::{LotteryAction, NoticeLevel};

const ACCENT: egui::Color32 = egui::Color32::from_rgb(0, 212, 170);
const BUTTON_FILL: egui::Color32 = egui::Color32::from_rgb(0, 180, 150);
const ERROR_RED: egui::Color32 = egui::Color32::from_rgb(220, 80, 80);
const SUCCESS_GREEN: egui::Color32 = egui::Color32::from_rgb(80, 200, 120);
const INFO_BLUE: egui::Color32 = egui::Color32::from_rgb(90, 160, 230);
const WARNING_YELLOW: egui::Color32 = egui::Color32::from_rgb(220, 180, 50);

/// Styled heading with accent color
pub fn styled_heading(ui: &mut egui::Ui, text: &str) {
    ui.heading(egui::RichText::new(text).color(ACCENT));
}

/// Section header with separator
pub fn section_header(ui: &mut egui::Ui, text: &str) {
    ui.add_space(10.0);
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(text).strong().size(14.0));
    });
    ui.separator();
}

/// `label: value` row with a monospace value
pub fn labeled_value(ui: &mut egui::Ui, label: &str, value: &str) {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(format!("{label}:")).strong());
        ui.label(egui::RichText::new(value).monospace());
    });
}

pub fn loading_spinner(ui: &mut egui::Ui, text: &str) {
    ui.horizontal(|ui| {
        ui.spinner();
        ui.label(text);
    });
}

pub fn error_message(ui: &mut egui::Ui, message: &str) {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new("❌").size(16.0));
        ui.label(egui::RichText::new(message).color(ERROR_RED));
    });
}

pub fn warning_message(ui: &mut egui::Ui, message: &str) {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new("⚠️").size(14.0));
        ui.label(egui::RichText::new(message).color(WARNING_YELLOW));
    });
}

/// Primary button with enabled state
pub fn primary_button_enabled(ui: &mut egui::Ui, text: &str, enabled: bool) -> egui::Response {
    let btn = egui::Button::new(egui::RichText::new(text).size(14.0).color(egui::Color32::WHITE))
        .min_size(egui::vec2(130.0, 34.0))
        .fill(BUTTON_FILL);
    ui.add_enabled(enabled, btn)
}

/// Secondary action button - subdued, outline style
pub fn secondary_button(ui: &mut egui::Ui, text: &str) -> egui::Response {
    let btn =
        egui::Button::new(egui::RichText::new(text).size(14.0)).min_size(egui::vec2(90.0, 34.0));
    ui.add(btn)
}

/// Render content in a subtle card/frame
pub fn card(ui: &mut egui::Ui, add_contents: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::none()
        .fill(ui.visuals().faint_bg_color)
        .rounding(6.0)
        .inner_margin(12.0)
        .show(ui, add_contents);
}

pub fn notice_color(level: NoticeLevel) -> egui::Color32 {
    match level {
        NoticeLevel::Success => SUCCESS_GREEN,
        NoticeLevel::Info => INFO_BLUE,
        NoticeLevel::Error => ERROR_RED,
    }
}

pub fn notice_icon(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Success => "✅",
        NoticeLevel::Info => "ℹ",
        NoticeLevel::Error => "❌",
    }
}

/// Button caption; only `enter` carries the fee.
pub fn action_label(action: LotteryAction, entry_fee: &str) -> String {
    match action {
        LotteryAction::Enter => format!("Enter Lottery ({entry_fee} ETH)"),
        LotteryAction::Start => "Start Lottery".to_owned(),
        LotteryAction::End => "End Lottery".to_owned(),
        LotteryAction::Withdraw => "Withdraw Prize".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_label_shows_fee() {
        assert_eq!(
            action_label(LotteryAction::Enter, "0.01"),
            "Enter Lottery (0.01 ETH)"
        );
        assert_eq!(action_label(LotteryAction::Withdraw, "0.01"), "Withdraw Prize");
    }

    #[test]
    fn notice_levels_have_distinct_colors() {
        let colors = [
            notice_color(NoticeLevel::Success),
            notice_color(NoticeLevel::Info),
            notice_color(NoticeLevel::Error),
        ];
        assert_ne!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
        assert_ne!(colors[0], colors[2]);
    }
}
