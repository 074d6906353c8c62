// Instance snapshots.

use serde_json::json;

use crate::error::Result;
use crate::format::{format_bytes, utc_str_to_local};
use crate::models::{decode, decode_list, Snapshot};
use crate::output::{kv_table, status_color, StatusKind};
use crate::select::yes_no;
use crate::session::Session;

use super::{not_selected, pick, print_status_info, Context};

const COLUMNS: [&str; 2] = ["description", "status"];

/// List snapshots and select one (or none); `false` when the list was
/// rejected.
pub fn select(ctx: &Context, session: &mut Session) -> Result<bool> {
    let Some(data) = ctx.vultr_get("snapshots?per_page=500")? else {
        return Ok(false);
    };
    let snapshots: Vec<Snapshot> = decode_list(&data, "snapshots")?;
    let menu = ctx.menu("What snapshot to select?: ", "id", &COLUMNS).none_option(true);
    session.snapshot = pick(menu, &snapshots)?;
    Ok(true)
}

pub fn show(ctx: &Context, session: &Session) -> Result<()> {
    let Some(selected) = &session.snapshot else {
        not_selected("Snapshot");
        return Ok(());
    };
    let Some(data) = ctx.vultr_get(&format!("snapshots/{}", selected.id))? else {
        return Ok(());
    };
    let snapshot: Snapshot = decode(&data, "snapshot")?;
    println!(
        "{}",
        kv_table(vec![
            ("Date Created", utc_str_to_local(&snapshot.date_created)),
            ("Description", snapshot.description.clone()),
            ("Size", format_bytes(snapshot.size)),
            ("Compressed Size", format_bytes(snapshot.compressed_size)),
            ("Status", status_color(StatusKind::Snapshot, &snapshot.status)),
        ])
    );
    Ok(())
}

/// Snapshot the selected instance.
pub fn create(ctx: &Context, session: &Session, description: &str) -> Result<()> {
    let Some(instance) = &session.instance else {
        not_selected("Instance");
        return Ok(());
    };
    let body = json!({
        "instance_id": instance.selection.id,
        "description": description,
    });
    if let Some(data) = ctx.vultr_post("snapshots", &body)? {
        let snapshot: Snapshot = decode(&data, "snapshot")?;
        println!(" Created snapshot '{}'", snapshot.description);
    }
    Ok(())
}

/// Rename the selected snapshot.
pub fn update(ctx: &Context, session: &mut Session, description: &str) -> Result<()> {
    let Some(selected) = session.snapshot.as_mut() else {
        not_selected("Snapshot");
        return Ok(());
    };
    let body = json!({ "description": description });
    if let Some(data) = ctx.vultr_put(&format!("snapshots/{}", selected.id), &body)? {
        print_status_info(&data);
        selected.desc = description.to_string();
    }
    Ok(())
}

pub fn delete(ctx: &Context, session: &mut Session) -> Result<()> {
    let Some(selected) = session.snapshot.clone() else {
        not_selected("Snapshot");
        return Ok(());
    };
    if !yes_no(&format!("Delete snapshot '{}'?", selected.desc))? {
        return Ok(());
    }
    delete_selected(ctx, session)
}

fn delete_selected(ctx: &Context, session: &mut Session) -> Result<()> {
    let Some(selected) = &session.snapshot else {
        return Ok(());
    };
    if let Some(data) = ctx.vultr_delete(&format!("snapshots/{}", selected.id))? {
        print_status_info(&data);
        session.snapshot = None;
    }
    Ok(())
}
