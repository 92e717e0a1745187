mod app;
mod commands;
mod config;
mod export;
mod logging;
mod paths;
mod recorder;
mod recordings;
mod story;
mod ui;

#[tokio::main]
async fn main() {
    if let Err(e) = app::run().await {
        tracing::error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
