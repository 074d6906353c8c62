// Vultr regions, served from the local cache.

use crate::cache::REGIONS;
use crate::error::Result;
use crate::models::Region;
use crate::output::kv_table;
use crate::session::Session;

use super::{not_selected, pick, preferred, Context};

const PATH: &str = "regions?per_page=500";
const COLUMNS: [&str; 3] = ["city", "country", "continent"];

pub fn load(ctx: &Context) -> Result<Vec<Region>> {
    ctx.cached_list(REGIONS, PATH, "regions", "regions")
}

/// Refresh the region cache from the API.
pub fn save(ctx: &Context) -> Result<()> {
    ctx.refresh_cache(REGIONS, PATH, "region")
}

/// Pick from the preferred list or from every region depending on settings.
pub fn select(ctx: &Context, session: &mut Session) -> Result<()> {
    if ctx.settings.preferred_region_only {
        select_preferred(ctx, session)
    } else {
        select_all(ctx, session)
    }
}

pub fn select_all(ctx: &Context, session: &mut Session) -> Result<()> {
    let regions = load(ctx)?;
    let menu = ctx.menu("What region to select?: ", "id", &COLUMNS).none_option(true);
    session.region = pick(menu, &regions)?;
    Ok(())
}

pub fn select_preferred(ctx: &Context, session: &mut Session) -> Result<()> {
    let regions = preferred(&load(ctx)?, &ctx.settings.preferred_region_ids, |r| r.id.clone());
    let menu = ctx.menu("What region to select?: ", "id", &COLUMNS);
    session.region = pick(menu, &regions)?;
    Ok(())
}

pub fn show(ctx: &Context, session: &Session) -> Result<()> {
    let Some(selected) = &session.region else {
        not_selected("Region");
        return Ok(());
    };
    let regions = load(ctx)?;
    if let Some(region) = regions.iter().find(|r| r.id == selected.id) {
        println!(
            "{}",
            kv_table(vec![
                ("ID", region.id.clone()),
                ("City", region.city.clone()),
                ("Country", region.country.clone()),
                ("Continent", region.continent.clone()),
                ("Options", region.options.join(", ")),
            ])
        );
    }
    Ok(())
}

/// City name for a region id, falling back to the id itself.
pub fn city_from_id(regions: &[Region], id: &str) -> String {
    regions
        .iter()
        .find(|r| r.id == id)
        .map(|r| r.city.clone())
        .unwrap_or_else(|| id.to_string())
}
