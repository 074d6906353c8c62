// Compute plans, served from the local cache and filtered by the selected
// region.

use serde::Serialize;

use crate::cache::PLANS;
use crate::error::Result;
use crate::format::format_currency;
use crate::models::Plan;
use crate::output::kv_table;
use crate::session::Session;

use super::{not_selected, pick, preferred, Context};

const PATH: &str = "plans?per_page=500";
const COLUMNS: [&str; 5] = ["id", "vcpus", "ram", "disk", "monthly"];

/// Flattened plan row for the selection table.
#[derive(Debug, Serialize)]
struct PlanRow {
    id: String,
    vcpus: u64,
    ram: String,
    disk: String,
    monthly: String,
}

impl From<&Plan> for PlanRow {
    fn from(plan: &Plan) -> Self {
        Self {
            id: plan.id.clone(),
            vcpus: plan.vcpu_count,
            ram: format!("{} MB", plan.ram),
            disk: format!("{} GB", plan.disk),
            monthly: format_currency(&plan.monthly_cost),
        }
    }
}

pub fn load(ctx: &Context) -> Result<Vec<Plan>> {
    ctx.cached_list(PLANS, PATH, "plans", "plans")
}

pub fn save(ctx: &Context) -> Result<()> {
    ctx.refresh_cache(PLANS, PATH, "plan")
}

/// Plans offered in `region_id`.
pub fn in_region(plans: &[Plan], region_id: &str) -> Vec<Plan> {
    plans
        .iter()
        .filter(|p| p.available_in(region_id))
        .cloned()
        .collect()
}

pub fn select(ctx: &Context, session: &mut Session, none_option: bool) -> Result<()> {
    if ctx.settings.preferred_plan_only {
        println!("Using preferred plans only.");
        select_preferred_region_plans(ctx, session, none_option)
    } else {
        println!("Using all plans.");
        select_region_plans(ctx, session, none_option)
    }
}

/// Choose among every plan available in the selected region.
pub fn select_region_plans(ctx: &Context, session: &mut Session, none_option: bool) -> Result<()> {
    let Some(region) = session.region.clone() else {
        not_selected("Region");
        return Ok(());
    };
    let plans = in_region(&load(ctx)?, &region.id);
    choose(ctx, session, &plans, none_option)
}

/// Choose among the preferred plans available in the selected region.
pub fn select_preferred_region_plans(ctx: &Context, session: &mut Session, none_option: bool) -> Result<()> {
    let Some(region) = session.region.clone() else {
        not_selected("Region");
        return Ok(());
    };
    let plans = in_region(&load(ctx)?, &region.id);
    let plans = preferred(&plans, &ctx.settings.preferred_plan_ids, |p| p.id.clone());
    choose(ctx, session, &plans, none_option)
}

fn choose(ctx: &Context, session: &mut Session, plans: &[Plan], none_option: bool) -> Result<()> {
    let rows: Vec<PlanRow> = plans.iter().map(PlanRow::from).collect();
    let menu = ctx.menu("What plan to select?: ", "id", &COLUMNS).none_option(none_option);
    session.plan = pick(menu, &rows)?;
    Ok(())
}

pub fn show(ctx: &Context, session: &Session) -> Result<()> {
    let Some(selected) = &session.plan else {
        not_selected("Plan");
        return Ok(());
    };
    if let Some(plan) = load(ctx)?.into_iter().find(|p| p.id == selected.id) {
        println!(
            "{}",
            kv_table(vec![
                ("ID", plan.id.clone()),
                ("Type", plan.kind.clone()),
                ("vCPU Count", plan.vcpu_count.to_string()),
                ("Ram", format!("{} MB", plan.ram)),
                ("Disk", format!("{} GB x {}", plan.disk, plan.disk_count)),
                ("Bandwidth", format!("{} GB", plan.bandwidth)),
                ("Monthly Cost", format_currency(&plan.monthly_cost)),
                ("Locations", plan.locations.join(", ")),
            ])
        );
    }
    Ok(())
}
