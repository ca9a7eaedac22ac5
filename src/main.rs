//! Tilenol Window Manager
//!
//! A tiling X11 window manager written in Rust.

use anyhow::Result;
use tilenol::config::{Config, LoggingConfig};
use tilenol::wm::EventDispatcher;
use tilenol::wm::groups::Groups;
use tilenol::wm::keyboard::KeyRegistry;
use tilenol::wm::ports::Transport;
use tilenol::x11::X11Transport;
use tilenol::x11_async::X11EventStream;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Config first so its filter can seed logging
    let config = Config::load();
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| match &config {
        Ok(config) => config.logging.filter.clone(),
        Err(_) => LoggingConfig::default().filter,
    });

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config.unwrap_or_else(|e| {
        warn!("Invalid configuration, using defaults: {:#}", e);
        Config::default_with_keys()
    });

    info!("Starting tilenol");

    run(config).await
}

async fn run(config: Config) -> Result<()> {
    let conn = X11Transport::connect(config.frame.clone())?;
    conn.become_wm()?;

    let keys = KeyRegistry::new(&config.keys);
    for (modifiers, keycode) in keys.grabs() {
        conn.grab_key(modifiers, keycode)?;
    }

    let groups = Groups::new(conn.clone(), &config.groups.names);
    let existing = conn.existing_windows()?;
    let stream = X11EventStream::new(conn.connection())?;

    let mut dispatcher = EventDispatcher::new(conn, keys, groups, config.frame);
    dispatcher.adopt_existing(&existing);
    dispatcher.transport().flush()?;

    info!("Entering event loop");
    loop {
        while let Some(event) = stream.poll_next_event()? {
            dispatcher.dispatch(&event);
        }
        stream.flush()?;
        stream.wait_readable().await;
    }
}
