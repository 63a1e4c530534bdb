//! Main application state and update loop

use std::time::{Duration, Instant};

use alloy::primitives::Address;
use eframe::egui;

use lottery_sync_adapters::LotteryAdapterConfig;
use lottery_sync_core::{short_address, ClientView, LotteryAction, Notice, Screen, StatusPanel};

use crate::ui;
use crate::worker::{Command, WorkerHandle};

const TOAST_TTL: Duration = Duration::from_secs(4);
const MAX_TOASTS: usize = 5;

struct Toast {
    notice: Notice,
    shown_at: Instant,
}

/// Short-lived notices stacked in the corner, newest last.
#[derive(Default)]
pub struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    pub fn push(&mut self, notice: Notice, now: Instant) {
        self.items.push(Toast {
            notice,
            shown_at: now,
        });
        if self.items.len() > MAX_TOASTS {
            let excess = self.items.len() - MAX_TOASTS;
            self.items.drain(..excess);
        }
    }

    pub fn expire(&mut self, now: Instant) {
        self.items
            .retain(|t| now.saturating_duration_since(t.shown_at) < TOAST_TTL);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter().map(|t| &t.notice)
    }
}

/// The main application state
pub struct App {
    worker: WorkerHandle,
    view: ClientView,
    toasts: Toasts,
    contract_address: Address,
}

impl App {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: LotteryAdapterConfig,
    ) -> std::io::Result<Self> {
        let contract_address = config.contract_address;
        let worker = WorkerHandle::spawn(config, cc.egui_ctx.clone())?;
        tracing::info!(mode = worker.mode(), "lottery worker spawned");
        Ok(Self {
            worker,
            view: ClientView {
                screen: Screen::ConnectPrompt { connecting: false },
                loading: false,
                error: None,
            },
            toasts: Toasts::default(),
            contract_address,
        })
    }

    fn check_worker_update(&mut self) {
        let Some(update) = self.worker.take_update() else {
            return;
        };
        let now = Instant::now();
        for notice in update.notices {
            self.toasts.push(notice, now);
        }
        self.view = update.view;
    }

    fn send(&self, command: Command) {
        if !self.worker.send(command) {
            tracing::warn!(?command, "lottery worker is gone, command dropped");
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());

        self.check_worker_update();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.heading(
                    egui::RichText::new("🎰 Lottery")
                        .size(22.0)
                        .color(egui::Color32::from_rgb(0, 212, 170)),
                );
                ui.add_space(30.0);
                ui.separator();
                ui.label(
                    egui::RichText::new(format!("contract {}", short_address(&self.contract_address)))
                        .monospace()
                        .weak(),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(egui::RichText::new(format!("wallet: {}", self.worker.mode())).weak());
                });
            });
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(10.0);
                match self.view.screen.clone() {
                    Screen::ConnectPrompt { connecting } => self.render_connect(ui, connecting),
                    Screen::NetworkMismatch {
                        account,
                        network_name,
                    } => self.render_network_mismatch(ui, &account, &network_name),
                    Screen::Status(panel) => self.render_status(ui, &panel),
                }
                ui.add_space(20.0);
            });
        });

        self.render_toasts(ctx);
    }
}

impl App {
    fn render_connect(&mut self, ui: &mut egui::Ui, connecting: bool) {
        ui::styled_heading(ui, "Decentralized Lottery");
        ui.label("Connect your wallet to view the current round and take part.");
        ui.add_space(15.0);

        if connecting {
            ui::loading_spinner(ui, "Connecting wallet...");
        } else if ui::primary_button_enabled(ui, "Connect Wallet", true).clicked() {
            self.view.screen = Screen::ConnectPrompt { connecting: true };
            self.send(Command::Connect);
        }
        self.render_inline_error(ui);
    }

    fn render_network_mismatch(&mut self, ui: &mut egui::Ui, account: &Address, network_name: &str) {
        ui::styled_heading(ui, "Wrong Network");
        ui::labeled_value(ui, "Account", &short_address(account));
        ui.add_space(8.0);
        ui::warning_message(ui, &format!("Please switch to {network_name} to use this lottery."));
        ui.add_space(12.0);

        ui.horizontal(|ui| {
            let label = format!("Switch to {network_name}");
            if ui::primary_button_enabled(ui, &label, !self.view.loading).clicked() {
                self.view.loading = true;
                self.send(Command::SwitchNetwork);
            }
            if ui::secondary_button(ui, "Disconnect").clicked() {
                self.send(Command::Disconnect);
            }
        });
        self.render_inline_error(ui);
    }

    fn render_status(&mut self, ui: &mut egui::Ui, panel: &StatusPanel) {
        ui::styled_heading(ui, "Lottery Status");
        ui.add_space(10.0);

        ui::card(ui, |ui| {
            ui.horizontal(|ui| {
                ui::labeled_value(ui, "Account", &short_address(&panel.account));
                if panel.is_owner {
                    ui.label(egui::RichText::new("owner").strong().color(egui::Color32::GOLD));
                }
            });
            ui::labeled_value(ui, "Status", if panel.open { "Open" } else { "Closed" });
            ui::labeled_value(ui, "Prize Pool", &format!("{} ETH", panel.prize_pool));
            ui::labeled_value(ui, "Entry Fee", &format!("{} ETH", panel.entry_fee));
            if let Some(countdown) = &panel.countdown {
                ui::labeled_value(ui, "Time Left", countdown);
            }
            if let Some(winner) = &panel.winner {
                ui::labeled_value(ui, "Winner", &short_address(winner));
            }
        });

        if panel.pending_randomness {
            ui.add_space(8.0);
            ui::loading_spinner(ui, "Waiting for randomness to pick a winner...");
        }

        ui::section_header(ui, &format!("Players ({})", panel.players.len()));
        if panel.players.is_empty() {
            ui.label(egui::RichText::new("No players yet").weak());
        }
        for player in &panel.players {
            let mut text = egui::RichText::new(player.to_checksum(None)).monospace();
            if *player == panel.account {
                text = text.strong();
            }
            ui.label(text);
        }

        ui::section_header(ui, "Actions");
        let visible = panel.actions.visible();
        if visible.is_empty() {
            ui.label(egui::RichText::new("Nothing to do right now").weak());
        }
        ui.horizontal_wrapped(|ui| {
            for action in visible {
                let label = ui::action_label(action, &panel.entry_fee);
                if ui::primary_button_enabled(ui, &label, !self.view.loading).clicked() {
                    self.submit(action);
                }
            }
            if ui::secondary_button(ui, "Disconnect").clicked() {
                self.send(Command::Disconnect);
            }
        });

        if self.view.loading {
            ui.add_space(8.0);
            ui::loading_spinner(ui, "Waiting for transaction...");
        }
        self.render_inline_error(ui);
    }

    fn submit(&mut self, action: LotteryAction) {
        // block double clicks until the worker publishes the busy view
        self.view.loading = true;
        self.send(Command::Submit(action));
    }

    fn render_inline_error(&self, ui: &mut egui::Ui) {
        if let Some(error) = &self.view.error {
            ui.add_space(8.0);
            ui::error_message(ui, error);
        }
    }

    fn render_toasts(&mut self, ctx: &egui::Context) {
        self.toasts.expire(Instant::now());
        if self.toasts.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -12.0))
            .show(ctx, |ui| {
                for notice in self.toasts.notices() {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.label(ui::notice_icon(notice.level));
                            ui.label(
                                egui::RichText::new(&notice.message)
                                    .color(ui::notice_color(notice.level)),
                            );
                        });
                    });
                }
            });
        ctx.request_repaint_after(Duration::from_millis(500));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toasts_expire_and_cap() {
        let start = Instant::now();
        let mut toasts = Toasts::default();
        for i in 0..7 {
            toasts.push(Notice::info(format!("n{i}")), start);
        }
        let kept: Vec<_> = toasts.notices().map(|n| n.message.clone()).collect();
        assert_eq!(kept, vec!["n2", "n3", "n4", "n5", "n6"]);

        toasts.expire(start + TOAST_TTL - Duration::from_millis(1));
        assert!(!toasts.is_empty());
        toasts.expire(start + TOAST_TTL);
        assert!(toasts.is_empty());
    }
}
