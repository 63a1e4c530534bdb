//! Lottery dApp: desktop front end for the on-chain lottery

use eframe::egui;
use lottery_sync_adapters::LotteryAdapterConfig;

mod app;
mod ui;
mod worker;

fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = LotteryAdapterConfig::from_env()?;
    tracing::info!(
        profile = ?config.runtime_profile,
        contract = %config.contract_address,
        proxy = config.wallet_proxy_url.as_deref().unwrap_or("none"),
        "Starting lottery dApp"
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Lottery")
            .with_inner_size([720.0, 640.0])
            .with_min_inner_size([480.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Lottery",
        native_options,
        Box::new(|cc| Ok(Box::new(app::App::new(cc, config)?))),
    )
    .map_err(|e| eyre::eyre!("GUI exited with error: {e}"))
}
