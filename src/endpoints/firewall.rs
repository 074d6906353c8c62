// Vultr firewall groups and their rules. The selected group keeps a copy
// of its rules, reloaded before any bulk delete.

use serde_json::{json, Value};

use crate::error::Result;
use crate::format::utc_str_to_local;
use crate::models::{decode, decode_list, FirewallGroup, FirewallRule};
use crate::output::{grid_table, kv_table};
use crate::select::{text_prompt, yes_no, MenuOption};
use crate::session::{FirewallSelection, Session};

use super::ipify::IpFamily;
use super::{not_selected, pick, print_status_info, Context, CREATED_BY};

const RULE_HEADER: [&str; 6] = ["Type", "Action", "Protocol", "Ip", "Port", "Notes"];
const COLUMNS: [&str; 1] = ["description"];

/// Protocol/port pairs opened for a single address.
const OPEN_ALL: [(&str, &str); 3] = [("tcp", "1:65535"), ("udp", "1:65535"), ("icmp", "")];

/// List firewall groups and select one (or none); loads its rules.
///
/// Returns `false` when the list was rejected and the selection is untouched.
pub fn select(ctx: &Context, session: &mut Session) -> Result<bool> {
    let Some(data) = ctx.vultr_get("firewalls?per_page=500")? else {
        return Ok(false);
    };
    let groups: Vec<FirewallGroup> = decode_list(&data, "firewall_groups")?;
    let menu = ctx.menu("What firewall to select?: ", "id", &COLUMNS).none_option(true);
    session.firewall = pick(menu, &groups)?.map(|selection| FirewallSelection {
        selection,
        rules: Vec::new(),
    });
    refresh_rules(ctx, session)?;
    Ok(true)
}

pub fn show(ctx: &Context, session: &Session) -> Result<()> {
    let Some(firewall) = &session.firewall else {
        not_selected("Firewall");
        return Ok(());
    };
    let Some(data) = ctx.vultr_get(&format!("firewalls/{}", firewall.selection.id))? else {
        return Ok(());
    };
    let group: FirewallGroup = decode(&data, "firewall_group")?;
    println!(
        "{}",
        kv_table(vec![
            ("Description", group.description.clone()),
            ("Date Created", utc_str_to_local(&group.date_created)),
            ("Date Updated", utc_str_to_local(&group.date_modified)),
            ("Instance Count", group.instance_count.to_string()),
            ("Rule Count", group.rule_count.to_string()),
            ("Max Rule Count", group.max_rule_count.to_string()),
        ])
    );
    Ok(())
}

pub fn create_prompt(ctx: &Context, session: &mut Session) -> Result<()> {
    let name = text_prompt("New Firewall Name?")?;
    create(ctx, session, &name)
}

/// Create a firewall group and select it.
pub fn create(ctx: &Context, session: &mut Session, description: &str) -> Result<()> {
    let body = json!({ "description": description });
    if let Some(data) = ctx.vultr_post("firewalls", &body)? {
        let group: FirewallGroup = decode(&data, "firewall_group")?;
        println!(" Created firewall '{}'", group.description);
        session.firewall = Some(FirewallSelection {
            selection: crate::session::Selection::new(group.id, group.description),
            rules: Vec::new(),
        });
    }
    Ok(())
}

pub fn delete(ctx: &Context, session: &mut Session) -> Result<()> {
    let Some(firewall) = &session.firewall else {
        not_selected("Firewall");
        return Ok(());
    };
    if !yes_no(&format!("Delete firewall '{}'?", firewall.selection.desc))? {
        return Ok(());
    }
    if let Some(data) = ctx.vultr_delete(&format!("firewalls/{}", firewall.selection.id))? {
        print_status_info(&data);
        session.firewall = None;
    }
    Ok(())
}

/// Fetch the rules of the selected group into the session; `false` when
/// there is no group or the listing was rejected.
pub fn refresh_rules(ctx: &Context, session: &mut Session) -> Result<bool> {
    let Some(firewall) = session.firewall.as_mut() else {
        return Ok(false);
    };
    let path = format!("firewalls/{}/rules?per_page=500", firewall.selection.id);
    let Some(data) = ctx.vultr_get(&path)? else {
        return Ok(false);
    };
    firewall.rules = decode_list(&data, "firewall_rules")?;
    Ok(true)
}

pub fn show_rules(ctx: &Context, session: &mut Session) -> Result<()> {
    if session.firewall.is_none() {
        not_selected("Firewall");
        return Ok(());
    }
    if !refresh_rules(ctx, session)? {
        return Ok(());
    }
    if let Some(firewall) = &session.firewall {
        println!("{}", grid_table(&RULE_HEADER, rule_rows(&firewall.rules)));
    }
    Ok(())
}

fn rule_rows(rules: &[FirewallRule]) -> Vec<Vec<String>> {
    rules
        .iter()
        .map(|r| {
            vec![
                r.ip_type.clone(),
                r.action.clone(),
                r.protocol.clone(),
                r.cidr(),
                r.port.clone(),
                r.notes.clone(),
            ]
        })
        .collect()
}

pub fn delete_all_rules(ctx: &Context, session: &mut Session) -> Result<()> {
    let Some(firewall) = &session.firewall else {
        not_selected("Firewall");
        return Ok(());
    };
    if !yes_no(&format!("Delete every rule of '{}'?", firewall.selection.desc))? {
        return Ok(());
    }
    remove_rules(ctx, session, |_| true)
}

/// Pick one of the distinct rule notes and delete every rule carrying it.
pub fn delete_rules_by_note(ctx: &Context, session: &mut Session) -> Result<()> {
    if session.firewall.is_none() {
        not_selected("Firewall");
        return Ok(());
    }
    if !refresh_rules(ctx, session)? {
        return Ok(());
    }
    let notes = session
        .firewall
        .as_ref()
        .map(|f| distinct_notes(&f.rules))
        .unwrap_or_default();
    let menu = ctx.menu("What rule notes to delete?: ", "id", &["name"]);
    let Some(note) = pick(menu, &notes)? else {
        return Ok(());
    };
    remove_rules(ctx, session, |rule| rule.notes == note.id)
}

fn distinct_notes(rules: &[FirewallRule]) -> Vec<MenuOption> {
    let mut notes: Vec<MenuOption> = Vec::new();
    for rule in rules {
        if !notes.iter().any(|n| n.id == rule.notes) {
            notes.push(MenuOption::new(rule.notes.clone(), rule.notes.clone()));
        }
    }
    notes
}

/// Delete the selected group's rules for which `matches` holds, then reload them.
fn remove_rules<F>(ctx: &Context, session: &mut Session, matches: F) -> Result<()>
where
    F: Fn(&FirewallRule) -> bool,
{
    if !refresh_rules(ctx, session)? {
        return Ok(());
    }
    let Some(firewall) = &session.firewall else {
        return Ok(());
    };
    let targets: Vec<u64> = firewall.rules.iter().filter(|&r| matches(r)).map(|r| r.id).collect();
    for rule_id in targets {
        let path = format!("firewalls/{}/rules/{}", firewall.selection.id, rule_id);
        if let Some(data) = ctx.vultr_delete(&path)? {
            print_status_info(&data);
        }
    }
    refresh_rules(ctx, session)?;
    Ok(())
}

/// Open the selected group to this machine's public address.
pub fn add_my_ip(ctx: &Context, session: &Session, family: IpFamily) -> Result<()> {
    if session.firewall.is_none() {
        not_selected("Firewall");
        return Ok(());
    }
    let notes = text_prompt(&format!("Notes for the firewall rules? [{}]", CREATED_BY))?;
    let notes = if notes.is_empty() { CREATED_BY.to_string() } else { notes };
    let ip = ctx.ipify.public_ip(family)?;
    println!("My public IP{} address is: {}", family.ip_type().trim_start_matches('v'), ip);
    add_ip(ctx, session, family, &ip, &notes)
}

/// Add tcp, udp and icmp rules for a single address.
pub fn add_ip(ctx: &Context, session: &Session, family: IpFamily, ip: &str, notes: &str) -> Result<()> {
    let Some(firewall) = &session.firewall else {
        not_selected("Firewall");
        return Ok(());
    };
    let path = format!("firewalls/{}/rules", firewall.selection.id);
    let mut added = Vec::new();
    for body in rule_bodies(family, ip, notes) {
        if let Some(data) = ctx.vultr_post(&path, &body)? {
            println!("Added Firewall Rule");
            added.push(decode::<FirewallRule>(&data, "firewall_rule")?);
        }
    }
    println!("{}", grid_table(&RULE_HEADER, rule_rows(&added)));
    Ok(())
}

fn rule_bodies(family: IpFamily, ip: &str, notes: &str) -> Vec<Value> {
    OPEN_ALL
        .iter()
        .map(|(protocol, port)| {
            json!({
                "ip_type": family.ip_type(),
                "protocol": protocol,
                "port": port,
                "subnet": ip,
                "subnet_size": family.host_prefix(),
                "source": "",
                "notes": notes,
            })
        })
        .collect()
}
