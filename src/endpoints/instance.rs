// Vultr instances: selection, details, creation, deletion, firewall
// attachment and the DNS records pointing at them. Instances tagged "prod"
// are never deleted.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Map, Value};
use std::path::Path;
use tracing::info;

use crate::error::{CliError, Result};
use crate::format::{elapsed_since, format_currency, utc_str_to_local};
use crate::models::{decode, decode_list, FirewallGroup, Instance, PRODUCTION_TAG};
use crate::output::{kv_table, red, status_color, StatusKind};
use crate::select::{numbered, text_prompt, yes_no};
use crate::session::{InstanceSelection, Selection, Session};

use super::ipify::IpFamily;
use super::{
    application, firewall, not_selected, os, pick, plan, print_status_info, region, snapshot, zone,
    Context, CREATED_BY,
};

const COLUMNS: [&str; 3] = ["label", "main_ip", "region"];
const CLOUD_INIT_FILE: &str = "default.yml";
const DNS_TTL: u64 = 300;

/// List instances and select one (or none), then load its details.
pub fn select(ctx: &Context, session: &mut Session) -> Result<()> {
    let Some(data) = ctx.vultr_get("instances?per_page=500")? else {
        return Ok(());
    };
    let instances: Vec<Instance> = decode_list(&data, "instances")?;
    let menu = ctx.menu("What instance to select?: ", "id", &COLUMNS).none_option(true);
    match pick(menu, &instances)? {
        Some(selection) => load(ctx, session, &selection.id),
        None => {
            session.instance = None;
            Ok(())
        }
    }
}

/// Fetch one instance and make it the current selection.
pub fn load(ctx: &Context, session: &mut Session, id: &str) -> Result<()> {
    if let Some(data) = ctx.vultr_get(&format!("instances/{}", id))? {
        let instance: Instance = decode(&data, "instance")?;
        session.instance = Some(selection_from(instance));
    }
    Ok(())
}

fn selection_from(instance: Instance) -> InstanceSelection {
    InstanceSelection {
        selection: Selection::new(instance.id, instance.label),
        tags: instance.tags,
        hostname: instance.hostname,
        ip4: instance.main_ip,
        ip6: instance.v6_main_ip,
    }
}

pub fn show(ctx: &Context, session: &Session) -> Result<()> {
    let Some(selected) = &session.instance else {
        not_selected("Instance");
        return Ok(());
    };
    let Some(data) = ctx.vultr_get(&format!("instances/{}", selected.selection.id))? else {
        return Ok(());
    };
    let instance: Instance = decode(&data, "instance")?;

    let mut firewall_desc = String::new();
    if !instance.firewall_group_id.is_empty() {
        if let Some(fw) = ctx.vultr_get(&format!("firewalls/{}", instance.firewall_group_id))? {
            firewall_desc = decode::<FirewallGroup>(&fw, "firewall_group")?.description;
        }
    }
    let regions = region::load(ctx)?;

    println!(
        "{}",
        kv_table(vec![
            ("Label", instance.label.clone()),
            ("Hostname", instance.hostname.clone()),
            ("Tags", instance.tags.join(", ")),
            ("Region", region::city_from_id(&regions, &instance.region)),
            ("Date Created", utc_str_to_local(&instance.date_created)),
            ("Duration", elapsed_since(&instance.date_created)),
            ("Plan", instance.plan.clone()),
            ("OS", instance.os.clone()),
            ("OS ID", instance.os_id.to_string()),
            ("App Id", instance.app_id.to_string()),
            ("vCPU Count", instance.vcpu_count.to_string()),
            ("Ram", format!("{} MB", instance.ram)),
            ("Disk", format!("{} GB", instance.disk)),
            ("Allowed Bandwidth", format!("{} GB", instance.allowed_bandwidth)),
            ("v4 Main IP", instance.main_ip.clone()),
            ("v6 Main IP", instance.v6_main_ip.clone()),
            ("Firewall Group", firewall_desc),
            ("Status", status_color(StatusKind::Instance, &instance.status)),
            ("Power Status", status_color(StatusKind::Power, &instance.power_status)),
            ("Server Status", status_color(StatusKind::Server, &instance.server_status)),
            ("Features", instance.features.join(", ")),
            ("User Scheme", instance.user_scheme.clone()),
            ("Pending Charges", format_currency(&instance.pending_charges)),
        ])
    );
    Ok(())
}

/// Where the new instance's disk comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Snapshot(String),
    Os { id: String, user_data: Option<String> },
    Application { app_id: String, image_id: String },
}

/// Everything needed to build a create-instance request.
#[derive(Debug, Clone)]
pub struct NewInstance {
    pub label: String,
    pub region: String,
    pub plan: String,
    pub tags: Vec<String>,
    pub firewall_group_id: Option<String>,
    pub source: Source,
    pub activation_email: bool,
}

impl NewInstance {
    pub fn body(&self) -> Value {
        let mut body = Map::new();
        body.insert("region".into(), json!(self.region));
        body.insert("plan".into(), json!(self.plan));
        body.insert("label".into(), json!(self.label));
        body.insert("hostname".into(), json!(self.label));
        body.insert("tags".into(), json!(self.tags));
        body.insert("enable_ipv6".into(), json!(true));
        if let Some(fw) = &self.firewall_group_id {
            body.insert("firewall_group_id".into(), json!(fw));
        }
        match &self.source {
            Source::Snapshot(id) => {
                body.insert("snapshot_id".into(), json!(id));
            }
            Source::Os { id, user_data } => {
                body.insert("os_id".into(), json!(id.parse::<u64>().unwrap_or_default()));
                if let Some(data) = user_data {
                    body.insert("user_data".into(), json!(data));
                }
            }
            Source::Application { app_id, image_id } => {
                if image_id.is_empty() {
                    body.insert("app_id".into(), json!(app_id.parse::<u64>().unwrap_or_default()));
                } else {
                    body.insert("image_id".into(), json!(image_id));
                }
            }
        }
        if self.activation_email {
            body.insert("activation_email".into(), json!(true));
        }
        Value::Object(body)
    }
}

/// Read a cloud-init file and base64 encode it for `user_data`.
pub fn load_cloud_init(dir: &Path, file: &str) -> Result<String> {
    let path = dir.join(file);
    let raw = std::fs::read(&path).map_err(|e| CliError::Config {
        message: format!("cannot read cloud-init file {}", path.display()),
        source: Some(Box::new(e)),
    })?;
    Ok(STANDARD.encode(raw))
}

/// Ask for everything a new instance needs, then create it.
pub fn create_prompt(ctx: &Context, session: &mut Session) -> Result<()> {
    let label = text_prompt("Hostname/Label?")?;
    if label.is_empty() {
        println!("{}", red("A label is required."));
        return Ok(());
    }

    region::select(ctx, session)?;
    let Some(chosen_region) = session.region.clone() else {
        not_selected("Region");
        return Ok(());
    };
    plan::select(ctx, session, false)?;
    let Some(chosen_plan) = session.plan.clone() else {
        not_selected("Plan");
        return Ok(());
    };

    if !firewall::select(ctx, session)? {
        return Ok(());
    }
    let firewall_group_id = session.firewall.as_ref().map(|f| f.selection.id.clone());

    let sources = numbered(&["Snapshot", "Blank OS", "Application"]);
    let menu = ctx.menu("What OS to use?: ", "id", &["name"]);
    let Some(choice) = pick(menu, &sources)? else {
        return Ok(());
    };
    let source = match choice.id.as_str() {
        "1" => {
            if !snapshot::select(ctx, session)? {
                return Ok(());
            }
            let Some(ss) = &session.snapshot else {
                not_selected("Snapshot");
                return Ok(());
            };
            Source::Snapshot(ss.id.clone())
        }
        "2" => {
            os::select(ctx, session)?;
            let Some(chosen) = session.os.clone() else {
                not_selected("OS");
                return Ok(());
            };
            let user_data = if yes_no("Use Cloud Init?")? {
                Some(load_cloud_init(&ctx.settings.cloud_init_dir, CLOUD_INIT_FILE)?)
            } else {
                None
            };
            Source::Os { id: chosen.id, user_data }
        }
        _ => {
            application::select_preferred(ctx, session)?;
            let Some(app) = &session.application else {
                not_selected("Application");
                return Ok(());
            };
            Source::Application {
                app_id: app.selection.id.clone(),
                image_id: app.image_id.clone(),
            }
        }
    };

    let request = NewInstance {
        label,
        region: chosen_region.id,
        plan: chosen_plan.id,
        tags: ctx.settings.instance_tags.clone(),
        firewall_group_id,
        source,
        activation_email: ctx.settings.email_instance_creation,
    };
    create(ctx, session, &request.body())
}

/// Create an instance and select it.
pub fn create(ctx: &Context, session: &mut Session, body: &Value) -> Result<()> {
    if let Some(data) = ctx.vultr_post("instances", body)? {
        let instance: Instance = decode(&data, "instance")?;
        info!(id = %instance.id, label = %instance.label, "instance created");
        println!("Instance created and selected");
        load(ctx, session, &instance.id)?;
    }
    Ok(())
}

/// Refuse destructive actions on production-tagged instances.
fn guard_production(instance: &InstanceSelection) -> bool {
    if instance.is_production() {
        println!(
            "{}",
            red(&format!("CANNOT DELETE RESOURCES TAGGED AS '{}'", PRODUCTION_TAG))
        );
        return true;
    }
    false
}

pub fn delete(ctx: &Context, session: &mut Session) -> Result<()> {
    let Some(instance) = &session.instance else {
        not_selected("Instance");
        return Ok(());
    };
    if guard_production(instance) {
        return Ok(());
    }
    if !yes_no(&format!("Delete instance '{}'?", instance.selection.desc))? {
        return Ok(());
    }
    delete_selected(ctx, session)
}

fn delete_selected(ctx: &Context, session: &mut Session) -> Result<()> {
    let Some(instance) = &session.instance else {
        return Ok(());
    };
    if guard_production(instance) {
        return Ok(());
    }
    if let Some(data) = ctx.vultr_delete(&format!("instances/{}", instance.selection.id))? {
        print_status_info(&data);
        session.instance = None;
    }
    Ok(())
}

/// Attach the instance to a newly chosen firewall group ("None" detaches).
pub fn update_firewall(ctx: &Context, session: &mut Session) -> Result<()> {
    if session.instance.is_none() {
        not_selected("Instance");
        return Ok(());
    }
    if !firewall::select(ctx, session)? {
        return Ok(());
    }
    apply_firewall(ctx, session)
}

fn apply_firewall(ctx: &Context, session: &Session) -> Result<()> {
    let Some(instance) = &session.instance else {
        return Ok(());
    };
    let (group_id, desc) = match &session.firewall {
        Some(fw) => (fw.selection.id.clone(), fw.selection.desc.clone()),
        None => (String::new(), "None".to_string()),
    };
    let body = json!({ "firewall_group_id": group_id });
    if ctx
        .vultr_patch(&format!("instances/{}", instance.selection.id), &body)?
        .is_some()
    {
        println!("Firewall updated to {}", desc);
    }
    Ok(())
}

fn address(instance: &InstanceSelection, family: IpFamily) -> Option<&str> {
    let ip = match family {
        IpFamily::V4 => instance.ip4.as_str(),
        IpFamily::V6 => instance.ip6.as_str(),
    };
    match ip {
        "" | "0.0.0.0" | "::" => None,
        ip => Some(ip),
    }
}

/// DNS record body pointing the instance hostname at one of its addresses.
pub fn dns_body(hostname: &str, ip: &str, family: IpFamily, proxied: bool) -> Value {
    json!({
        "comment": CREATED_BY,
        "content": ip,
        "name": hostname,
        "proxied": proxied,
        "ttl": DNS_TTL,
        "type": match family {
            IpFamily::V4 => "A",
            IpFamily::V6 => "AAAA",
        },
    })
}

/// Create or update the A/AAAA record for the selected instance.
pub fn dns_from_hostname(ctx: &Context, session: &mut Session, family: IpFamily) -> Result<()> {
    let Some(instance) = session.instance.clone() else {
        not_selected("Instance");
        return Ok(());
    };
    let Some(ip) = address(&instance, family) else {
        println!("No IP address assigned yet.");
        return Ok(());
    };
    if !zone::select(ctx, session)? || session.zone.is_none() {
        return Ok(());
    }
    let proxied = yes_no("DNS Proxied?")?;
    let body = dns_body(&instance.hostname, ip, family, proxied);
    zone::create_or_update_record(ctx, session, &body)
}

/// Remove the DNS record pointing the instance hostname at its address.
pub fn delete_dns(ctx: &Context, session: &mut Session, family: IpFamily) -> Result<()> {
    let Some(instance) = session.instance.clone() else {
        not_selected("Instance");
        return Ok(());
    };
    if guard_production(&instance) {
        return Ok(());
    }
    let Some(ip) = address(&instance, family) else {
        println!("No IP address assigned yet.");
        return Ok(());
    };
    if !zone::select(ctx, session)? || session.zone.is_none() {
        return Ok(());
    }
    if zone::find_record(ctx, session, &instance.hostname, ip)? {
        zone::delete_record(ctx, session)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::serve;
    use crate::endpoints::testing::context;
    use crate::session::FirewallSelection;
    use tempfile::TempDir;

    fn request(source: Source) -> NewInstance {
        NewInstance {
            label: "web-1".into(),
            region: "ewr".into(),
            plan: "vc2-1c-1gb".into(),
            tags: vec!["cloudmenu".into()],
            firewall_group_id: None,
            source,
            activation_email: false,
        }
    }

    fn selected(tags: &[&str]) -> Session {
        let mut session = Session::new();
        session.instance = Some(InstanceSelection {
            selection: Selection::new("i-1", "web-1"),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            hostname: "web-1.example.com".into(),
            ip4: "192.0.2.10".into(),
            ip6: String::new(),
        });
        session
    }

    #[test]
    fn test_body_from_snapshot() {
        let body = request(Source::Snapshot("snap-1".into())).body();
        assert_eq!(body["snapshot_id"], "snap-1");
        assert_eq!(body["hostname"], "web-1");
        assert_eq!(body["tags"], json!(["cloudmenu"]));
        assert!(body.get("os_id").is_none());
        assert!(body.get("firewall_group_id").is_none());
        assert!(body.get("activation_email").is_none());
    }

    #[test]
    fn test_body_from_os_with_cloud_init() {
        let mut req = request(Source::Os {
            id: "1743".into(),
            user_data: Some("I2Nsb3VkLWNvbmZpZw==".into()),
        });
        req.firewall_group_id = Some("fw-1".into());
        req.activation_email = true;
        let body = req.body();
        assert_eq!(body["os_id"], 1743);
        assert_eq!(body["user_data"], "I2Nsb3VkLWNvbmZpZw==");
        assert_eq!(body["firewall_group_id"], "fw-1");
        assert_eq!(body["activation_email"], true);
    }

    #[test]
    fn test_body_from_application_prefers_image() {
        let marketplace = request(Source::Application {
            app_id: "0".into(),
            image_id: "openlitespeed-wordpress".into(),
        })
        .body();
        assert_eq!(marketplace["image_id"], "openlitespeed-wordpress");
        assert!(marketplace.get("app_id").is_none());

        let one_click = request(Source::Application {
            app_id: "37".into(),
            image_id: String::new(),
        })
        .body();
        assert_eq!(one_click["app_id"], 37);
    }

    #[test]
    fn test_load_cloud_init_encodes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("default.yml"), "#cloud-config").unwrap();
        assert_eq!(
            load_cloud_init(dir.path(), "default.yml").unwrap(),
            "I2Nsb3VkLWNvbmZpZw=="
        );
        assert!(load_cloud_init(dir.path(), "missing.yml").is_err());
    }

    #[test]
    fn test_dns_body() {
        let body = dns_body("web.example.com", "2001:db8::1", IpFamily::V6, true);
        assert_eq!(body["type"], "AAAA");
        assert_eq!(body["ttl"], 300);
        assert_eq!(body["proxied"], true);
        assert_eq!(body["comment"], CREATED_BY);
    }

    #[test]
    fn test_address_skips_unassigned() {
        let mut instance = InstanceSelection::default();
        instance.ip4 = "0.0.0.0".into();
        assert_eq!(address(&instance, IpFamily::V4), None);
        assert_eq!(address(&instance, IpFamily::V6), None);
        instance.ip6 = "2001:db8::9".into();
        assert_eq!(address(&instance, IpFamily::V6), Some("2001:db8::9"));
    }

    #[test]
    fn test_production_instance_is_never_deleted() {
        let (base, seen) = serve(vec![]);
        let dir = TempDir::new().unwrap();
        let ctx = context(&base, &dir);
        let mut session = selected(&["web", "prod"]);

        delete_selected(&ctx, &mut session).unwrap();
        assert!(seen.recv().is_err());
        assert!(session.instance.is_some());
    }

    #[test]
    fn test_delete_clears_selection() {
        let (base, seen) = serve(vec![(204, "")]);
        let dir = TempDir::new().unwrap();
        let ctx = context(&base, &dir);
        let mut session = selected(&["web"]);

        delete_selected(&ctx, &mut session).unwrap();
        assert_eq!(seen.recv().unwrap().request_line, "DELETE /instances/i-1 HTTP/1.1");
        assert!(session.instance.is_none());
    }

    #[test]
    fn test_create_selects_new_instance() {
        let (base, seen) = serve(vec![
            (202, r#"{"instance":{"id":"i-new","label":"web-2","main_ip":"0.0.0.0"}}"#),
            (200, r#"{"instance":{"id":"i-new","label":"web-2","hostname":"web-2","tags":["cloudmenu"]}}"#),
        ]);
        let dir = TempDir::new().unwrap();
        let ctx = context(&base, &dir);
        let mut session = Session::new();

        create(&ctx, &mut session, &request(Source::Snapshot("s".into())).body()).unwrap();
        assert_eq!(seen.recv().unwrap().request_line, "POST /instances HTTP/1.1");
        assert_eq!(seen.recv().unwrap().request_line, "GET /instances/i-new HTTP/1.1");
        let instance = session.instance.unwrap();
        assert_eq!(instance.selection, Selection::new("i-new", "web-2"));
        assert_eq!(instance.tags, vec!["cloudmenu"]);
    }

    #[test]
    fn test_update_firewall_skips_after_rejected_list() {
        let (base, seen) = serve(vec![(403, r#"{"error":"Unauthorized IP address"}"#)]);
        let dir = TempDir::new().unwrap();
        let ctx = context(&base, &dir);
        let mut session = selected(&[]);

        update_firewall(&ctx, &mut session).unwrap();
        let lines: Vec<String> = seen.iter().map(|s| s.request_line).collect();
        assert_eq!(lines, vec!["GET /firewalls?per_page=500 HTTP/1.1"]);
    }

    #[test]
    fn test_delete_dns_skips_after_rejected_zone_list() {
        let (base, seen) = serve(vec![(
            403,
            r#"{"success":false,"errors":[{"code":9109,"message":"Invalid access token"}]}"#,
        )]);
        let dir = TempDir::new().unwrap();
        let ctx = context(&base, &dir);
        let mut session = selected(&["web"]);
        session.zone = Some(Selection::new("z-old", "example.com"));

        delete_dns(&ctx, &mut session, IpFamily::V4).unwrap();
        let lines: Vec<String> = seen.iter().map(|s| s.request_line).collect();
        assert_eq!(lines, vec!["GET /zones?per_page=50 HTTP/1.1"]);
        assert!(session.dns_record.is_none());
    }

    #[test]
    fn test_apply_firewall_patches_group() {
        let (base, seen) = serve(vec![(204, "")]);
        let dir = TempDir::new().unwrap();
        let ctx = context(&base, &dir);
        let mut session = selected(&[]);
        session.firewall = Some(FirewallSelection {
            selection: Selection::new("fw-3", "web"),
            rules: Vec::new(),
        });

        apply_firewall(&ctx, &session).unwrap();
        let req = seen.recv().unwrap();
        assert_eq!(req.request_line, "PATCH /instances/i-1 HTTP/1.1");
        let body: Value = serde_json::from_str(&req.body).unwrap();
        assert_eq!(body, json!({"firewall_group_id": "fw-3"}));
    }
}
