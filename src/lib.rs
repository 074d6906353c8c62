// Library root
// -----------
// The binary (`main.rs`) loads credentials and settings, then hands a
// `Context` to the menu loop. Everything else lives here so it can be
// tested without a terminal.
//
// Module responsibilities:
// - `api`: HTTP client for Vultr and Cloudflare; normalizes every reply to
//   a JSON mapping and retries transient GET failures.
// - `validate`: provider-specific checks of those mappings.
// - `cache`: JSON snapshots of the large catalogs (plans, regions, OS,
//   applications) on disk.
// - `select`: numbered selection tables and simple prompts.
// - `endpoints`: one module per resource area, plus the shared `Context`.
// - `menu`: the screen loop that dispatches to `endpoints`.
// - `config`, `session`, `models`, `format`, `output`, `error`: settings,
//   selection state, typed payloads, display helpers and error types.
pub mod api;
pub mod cache;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod format;
pub mod menu;
pub mod models;
pub mod output;
pub mod select;
pub mod session;
pub mod validate;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging on stderr. `RUST_LOG` wins over the `debug` flag.
pub fn setup_logging(debug: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .with(filter)
        .try_init()?;
    Ok(())
}
