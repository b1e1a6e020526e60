//! polysynth - play the engine from the terminal
//!
//! Run with: cargo run --bin polysynth
//! Set RUST_LOG (e.g. RUST_LOG=polysynth=info) to log to stderr.

mod app;
mod ui;

use app::Polysynth;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    Polysynth::new().voices(16).run()
}
