mod api;
mod app;
mod graph;
mod util;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the backend serving the transfer graph.
    #[arg(long, env = "BASE_URL", default_value = "http://localhost:3000")]
    base_url: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let client = api::ApiClient::new(&args.base_url).context("building HTTP client")?;

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1600.0, 760.0]),
        ..Default::default()
    };

    eframe::run_native(
        "txgraph",
        options,
        Box::new(move |cc| Ok(Box::new(app::ExplorerApp::new(cc, client)))),
    )
    .map_err(|error| anyhow::anyhow!("event loop exited with an error: {error}"))
}
