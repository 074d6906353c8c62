// Entrypoint for the CLI application.
// - Loads `.env`, credentials and the settings file before anything touches
//   the network; any of them missing is fatal.
// - Hands a `Context` to the menu loop, which blocks until the operator
//   exits.

use std::process;

use cloudmenu::config::{Credentials, Settings};
use cloudmenu::endpoints::Context;
use cloudmenu::menu::main_menu;
use cloudmenu::output::red;
use cloudmenu::setup_logging;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let (credentials, settings) = match Credentials::from_env().and_then(|c| Ok((c, Settings::load()?))) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("{}", red(&err.to_string()));
            process::exit(1);
        }
    };

    setup_logging(settings.debug)?;
    let ctx = Context::new(settings, &credentials)?;
    tracing::debug!(cache_dir = %ctx.cache.dir().display(), "starting");
    main_menu(&ctx)?;
    Ok(())
}
