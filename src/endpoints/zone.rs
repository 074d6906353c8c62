// Cloudflare zones and DNS records. Cloudflare wraps every payload in the v4
// envelope, so records are decoded from `result`.

use serde_json::Value;

use crate::error::Result;
use crate::format::utc_str_to_local;
use crate::models::{decode, decode_list, DnsRecord, Zone};
use crate::output::{grid_table, kv_table};
use crate::select::yes_no;
use crate::session::{Selection, Session};

use super::{not_selected, pick, Context};

const ZONE_COLUMNS: [&str; 2] = ["name", "status"];
const RECORD_COLUMNS: [&str; 3] = ["name", "type", "content"];

/// Check the Cloudflare token and print its status.
pub fn verify_token(ctx: &Context) -> Result<()> {
    let Some(data) = ctx.cf_get("user/tokens/verify")? else {
        return Ok(());
    };
    let result = data.get("result").cloned().unwrap_or(Value::Null);
    let field = |key: &str| {
        result
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    println!(
        "{}",
        kv_table(vec![
            ("Account", ctx.cloudflare_email.clone()),
            ("Token Id", field("id")),
            ("Status", field("status")),
            ("Expires", utc_str_to_local(&field("expires_on"))),
        ])
    );
    Ok(())
}

/// Select a zone (clearing the record selection when it changes).
///
/// Returns `false` when the zone list was rejected and nothing changed.
pub fn select(ctx: &Context, session: &mut Session) -> Result<bool> {
    let Some(data) = ctx.cf_get("zones?per_page=50")? else {
        return Ok(false);
    };
    let zones: Vec<Zone> = decode_list(&data, "result")?;
    let menu = ctx.menu("What DNS zone to select?: ", "id", &ZONE_COLUMNS);
    let zone = pick(menu, &zones)?;
    if zone != session.zone {
        session.dns_record = None;
    }
    session.zone = zone;
    Ok(true)
}

fn records(ctx: &Context, zone: &Selection, query: &str) -> Result<Option<Vec<DnsRecord>>> {
    let path = format!("zones/{}/dns_records?per_page=100{}", zone.id, query);
    match ctx.cf_get(&path)? {
        Some(data) => Ok(Some(decode_list(&data, "result")?)),
        None => Ok(None),
    }
}

/// Select one record of the selected zone (or none).
pub fn select_record(ctx: &Context, session: &mut Session) -> Result<()> {
    let Some(zone) = session.zone.clone() else {
        not_selected("DNS Zone");
        return Ok(());
    };
    let Some(list) = records(ctx, &zone, "")? else {
        return Ok(());
    };
    let menu = ctx.menu("What DNS record to select?: ", "id", &RECORD_COLUMNS).none_option(true);
    session.dns_record = pick(menu, &list)?;
    Ok(())
}

pub fn show_records(ctx: &Context, session: &Session) -> Result<()> {
    let Some(zone) = &session.zone else {
        not_selected("DNS Zone");
        return Ok(());
    };
    let Some(list) = records(ctx, zone, "")? else {
        return Ok(());
    };
    let rows = list
        .iter()
        .map(|r| {
            vec![
                r.name.clone(),
                r.kind.clone(),
                r.content.clone(),
                r.proxied.to_string(),
                r.ttl.to_string(),
                r.comment.clone().unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        grid_table(&["Name", "Type", "Content", "Proxied", "TTL", "Comment"], rows)
    );
    Ok(())
}

/// Select the record matching `name` and `content`; returns whether one was
/// found.
pub fn find_record(ctx: &Context, session: &mut Session, name: &str, content: &str) -> Result<bool> {
    let Some(zone) = session.zone.clone() else {
        not_selected("DNS Zone");
        return Ok(false);
    };
    let query = format!("&name={}&content={}", name, content);
    let Some(list) = records(ctx, &zone, &query)? else {
        return Ok(false);
    };
    match list.into_iter().find(|r| r.name == name && r.content == content) {
        Some(record) => {
            session.dns_record = Some(Selection::new(record.id, record.name));
            Ok(true)
        }
        None => {
            println!("No DNS record for {} -> {}", name, content);
            Ok(false)
        }
    }
}

/// Create the record described by `body`, or overwrite the existing record
/// with the same name and type.
pub fn create_or_update_record(ctx: &Context, session: &mut Session, body: &Value) -> Result<()> {
    let Some(zone) = session.zone.clone() else {
        not_selected("DNS Zone");
        return Ok(());
    };
    let name = body.get("name").and_then(Value::as_str).unwrap_or_default();
    let kind = body.get("type").and_then(Value::as_str).unwrap_or_default();
    let Some(list) = records(ctx, &zone, &format!("&name={}&type={}", name, kind))? else {
        return Ok(());
    };
    let existing = list.into_iter().find(|r| r.name == name && r.kind == kind);

    let reply = match &existing {
        Some(record) => ctx.cf_put(&format!("zones/{}/dns_records/{}", zone.id, record.id), body)?,
        None => ctx.cf_post(&format!("zones/{}/dns_records", zone.id), body)?,
    };
    if let Some(data) = reply {
        let record: DnsRecord = decode(&data, "result")?;
        let verb = if existing.is_some() { "Updated" } else { "Created" };
        println!(" {} {} record {} -> {}", verb, record.kind, record.name, record.content);
        session.dns_record = Some(Selection::new(record.id, record.name));
    }
    Ok(())
}

pub fn delete_record(ctx: &Context, session: &mut Session) -> Result<()> {
    let Some(record) = &session.dns_record else {
        not_selected("DNS Record");
        return Ok(());
    };
    if !yes_no(&format!("Delete DNS record '{}'?", record.desc))? {
        return Ok(());
    }
    delete_selected_record(ctx, session)
}

/// Delete the selected record without asking.
pub(crate) fn delete_selected_record(ctx: &Context, session: &mut Session) -> Result<()> {
    let (Some(zone), Some(record)) = (&session.zone, &session.dns_record) else {
        not_selected("DNS Record");
        return Ok(());
    };
    let path = format!("zones/{}/dns_records/{}", zone.id, record.id);
    if ctx.cf_delete(&path)?.is_some() {
        println!(" Deleted DNS record {}", record.desc);
        session.dns_record = None;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::serve;
    use crate::endpoints::testing::context;
    use serde_json::json;
    use tempfile::TempDir;

    fn with_zone() -> Session {
        let mut session = Session::new();
        session.zone = Some(Selection::new("z-1", "example.com"));
        session
    }

    #[test]
    fn test_create_posts_when_missing() {
        let (base, seen) = serve(vec![
            (200, r#"{"success":true,"errors":[],"result":[]}"#),
            (200, r#"{"success":true,"errors":[],"result":{"id":"r-1","name":"web.example.com","type":"A","content":"192.0.2.4"}}"#),
        ]);
        let dir = TempDir::new().unwrap();
        let ctx = context(&base, &dir);
        let mut session = with_zone();
        let body = json!({"name": "web.example.com", "type": "A", "content": "192.0.2.4", "ttl": 300});

        create_or_update_record(&ctx, &mut session, &body).unwrap();
        assert_eq!(
            seen.recv().unwrap().request_line,
            "GET /zones/z-1/dns_records?per_page=100&name=web.example.com&type=A HTTP/1.1"
        );
        assert_eq!(seen.recv().unwrap().request_line, "POST /zones/z-1/dns_records HTTP/1.1");
        assert_eq!(session.dns_record, Some(Selection::new("r-1", "web.example.com")));
    }

    #[test]
    fn test_create_puts_when_present() {
        let (base, seen) = serve(vec![
            (200, r#"{"success":true,"result":[{"id":"r-7","name":"web.example.com","type":"A","content":"192.0.2.1"}]}"#),
            (200, r#"{"success":true,"result":{"id":"r-7","name":"web.example.com","type":"A","content":"192.0.2.4"}}"#),
        ]);
        let dir = TempDir::new().unwrap();
        let ctx = context(&base, &dir);
        let mut session = with_zone();
        let body = json!({"name": "web.example.com", "type": "A", "content": "192.0.2.4"});

        create_or_update_record(&ctx, &mut session, &body).unwrap();
        seen.recv().unwrap();
        assert_eq!(seen.recv().unwrap().request_line, "PUT /zones/z-1/dns_records/r-7 HTTP/1.1");
    }

    #[test]
    fn test_create_skips_when_lookup_rejected() {
        let (base, seen) = serve(vec![(
            403,
            r#"{"success":false,"errors":[{"code":10000,"message":"Authentication error"}]}"#,
        )]);
        let dir = TempDir::new().unwrap();
        let ctx = context(&base, &dir);
        let mut session = with_zone();
        let body = json!({"name": "web.example.com", "type": "A", "content": "192.0.2.4"});

        create_or_update_record(&ctx, &mut session, &body).unwrap();
        assert_eq!(seen.iter().count(), 1);
        assert!(session.dns_record.is_none());
    }

    #[test]
    fn test_select_keeps_zone_when_list_rejected() {
        let (base, seen) = serve(vec![(
            403,
            r#"{"success":false,"errors":[{"code":9109,"message":"Invalid access token"}]}"#,
        )]);
        let dir = TempDir::new().unwrap();
        let ctx = context(&base, &dir);
        let mut session = with_zone();
        session.dns_record = Some(Selection::new("r-1", "web.example.com"));

        assert!(!select(&ctx, &mut session).unwrap());
        assert_eq!(seen.recv().unwrap().request_line, "GET /zones?per_page=50 HTTP/1.1");
        assert_eq!(session.zone, Some(Selection::new("z-1", "example.com")));
        assert!(session.dns_record.is_some());
    }

    #[test]
    fn test_find_record_matches_name_and_content() {
        let (base, _seen) = serve(vec![(
            200,
            r#"{"success":true,"result":[{"id":"r-2","name":"db.example.com","type":"AAAA","content":"2001:db8::2"}]}"#,
        )]);
        let dir = TempDir::new().unwrap();
        let ctx = context(&base, &dir);
        let mut session = with_zone();

        assert!(find_record(&ctx, &mut session, "db.example.com", "2001:db8::2").unwrap());
        assert_eq!(session.dns_record.unwrap().id, "r-2");
    }

    #[test]
    fn test_find_record_without_zone() {
        let (base, seen) = serve(vec![]);
        let dir = TempDir::new().unwrap();
        let ctx = context(&base, &dir);
        assert!(!find_record(&ctx, &mut Session::new(), "a", "b").unwrap());
        assert!(seen.recv().is_err());
    }

    #[test]
    fn test_delete_rejected_keeps_selection() {
        let (base, _seen) = serve(vec![(
            403,
            r#"{"success":false,"errors":[{"code":10000,"message":"Authentication error"}]}"#,
        )]);
        let dir = TempDir::new().unwrap();
        let ctx = context(&base, &dir);
        let mut session = with_zone();
        session.dns_record = Some(Selection::new("r-1", "web.example.com"));

        delete_selected_record(&ctx, &mut session).unwrap();
        assert!(session.dns_record.is_some());
    }
}
