// Marketplace and one-click applications, served from the local cache.
// Selecting one also records its image id for instance creation.

use crate::cache::APPLICATIONS;
use crate::error::Result;
use crate::models::Application;
use crate::output::kv_table;
use crate::session::{ApplicationSelection, Session};

use super::{not_selected, pick, preferred, Context};

const PATH: &str = "applications?per_page=500";
const COLUMNS: [&str; 3] = ["id", "name", "type"];

pub fn load(ctx: &Context) -> Result<Vec<Application>> {
    ctx.cached_list(APPLICATIONS, PATH, "applications", "applications")
}

pub fn save(ctx: &Context) -> Result<()> {
    ctx.refresh_cache(APPLICATIONS, PATH, "application")
}

pub fn select_all(ctx: &Context, session: &mut Session) -> Result<()> {
    let apps = load(ctx)?;
    let menu = ctx.menu("What Application to select?: ", "id", &COLUMNS).none_option(true);
    choose(session, menu, &apps)
}

pub fn select_preferred(ctx: &Context, session: &mut Session) -> Result<()> {
    let apps = preferred(&load(ctx)?, &ctx.settings.preferred_application_ids, |a| a.id);
    let menu = ctx.menu("What Application to select?: ", "id", &COLUMNS);
    choose(session, menu, &apps)
}

fn choose(session: &mut Session, menu: crate::select::SelectMenu<'_>, apps: &[Application]) -> Result<()> {
    session.application = pick(menu, apps)?.and_then(|mut selection| {
        let app = apps.iter().find(|a| a.id.to_string() == selection.id)?;
        // Menu shows the id first; describe the selection by name.
        selection.desc = app.name.clone();
        Some(ApplicationSelection {
            selection,
            image_id: app.image_id.clone(),
        })
    });
    Ok(())
}

pub fn show(ctx: &Context, session: &Session) -> Result<()> {
    let Some(selected) = &session.application else {
        not_selected("Application");
        return Ok(());
    };
    let found = load(ctx)?
        .into_iter()
        .find(|a| a.id.to_string() == selected.selection.id);
    if let Some(app) = found {
        println!(
            "{}",
            kv_table(vec![
                ("ID", app.id.to_string()),
                ("Name", app.name),
                ("Short Name", app.short_name),
                ("Deploy Name", app.deploy_name),
                ("Type", app.kind),
                ("Vendor", app.vendor),
                ("Image Id", app.image_id),
            ])
        );
    }
    Ok(())
}
