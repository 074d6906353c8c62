// Operating system images, served from the local cache.

use crate::cache::OPERATING_SYSTEMS;
use crate::error::Result;
use crate::models::OperatingSystem;
use crate::output::kv_table;
use crate::session::Session;

use super::{not_selected, pick, preferred, Context};

const PATH: &str = "os?per_page=500";
const COLUMNS: [&str; 3] = ["name", "arch", "family"];

pub fn load(ctx: &Context) -> Result<Vec<OperatingSystem>> {
    ctx.cached_list(OPERATING_SYSTEMS, PATH, "os", "operating systems")
}

pub fn save(ctx: &Context) -> Result<()> {
    ctx.refresh_cache(OPERATING_SYSTEMS, PATH, "operating system")
}

pub fn select(ctx: &Context, session: &mut Session) -> Result<()> {
    if ctx.settings.preferred_os_only {
        select_preferred(ctx, session)
    } else {
        select_all(ctx, session)
    }
}

pub fn select_all(ctx: &Context, session: &mut Session) -> Result<()> {
    let systems = load(ctx)?;
    let menu = ctx.menu("What OS to select?: ", "id", &COLUMNS).none_option(true);
    session.os = pick(menu, &systems)?;
    Ok(())
}

pub fn select_preferred(ctx: &Context, session: &mut Session) -> Result<()> {
    let systems = preferred(&load(ctx)?, &ctx.settings.preferred_os_ids, |o| o.id);
    let menu = ctx.menu("What OS to select?: ", "id", &COLUMNS);
    session.os = pick(menu, &systems)?;
    Ok(())
}

pub fn show(ctx: &Context, session: &Session) -> Result<()> {
    let Some(selected) = &session.os else {
        not_selected("OS");
        return Ok(());
    };
    let found = load(ctx)?
        .into_iter()
        .find(|o| o.id.to_string() == selected.id);
    if let Some(os) = found {
        println!(
            "{}",
            kv_table(vec![
                ("ID", os.id.to_string()),
                ("Name", os.name),
                ("Arch", os.arch),
                ("Family", os.family),
            ])
        );
    }
    Ok(())
}
