// Behaviour of the public building blocks: selection menu, validators,
// cache and formatters.

use chrono::FixedOffset;
use cloudmenu::cache::DataCache;
use cloudmenu::format::{format_bytes, format_currency, timestamp_in};
use cloudmenu::select::SelectMenu;
use cloudmenu::validate::{valid_response_cloudflare, valid_response_vultr};
use serde_json::{json, Value};
use std::io::Cursor;
use tempfile::TempDir;

fn alpha_beta() -> Vec<Value> {
    vec![
        json!({"id": "a", "name": "Alpha"}),
        json!({"id": "b", "name": "Beta"}),
    ]
}

fn run_menu(menu: &SelectMenu<'_>, records: &[Value], input: &str) -> (Option<cloudmenu::select::MenuChoice>, String) {
    let mut input = Cursor::new(input.as_bytes().to_vec());
    let mut out = Vec::new();
    let choice = menu.run_with(records, &mut input, &mut out).unwrap();
    (choice, String::from_utf8(out).unwrap())
}

#[test]
fn menu_rejects_out_of_range_then_accepts_each_record() {
    let records = alpha_beta();
    let keys = ["name"];
    let menu = SelectMenu::new("pick", "id", &keys);

    let (choice, out) = run_menu(&menu, &records, "0\n3\nx\n1\n");
    assert!(out.contains("0 is not between 1 and 2"));
    assert!(out.contains("3 is not between 1 and 2"));
    assert!(out.contains("x is not a number"));
    assert_eq!(choice.unwrap().selected(), Some(("a", "Alpha")));

    for (n, expected) in [(1, ("a", "Alpha")), (2, ("b", "Beta"))] {
        let (choice, _) = run_menu(&menu, &records, &format!("{}\n", n));
        assert_eq!(choice.unwrap().selected(), Some(expected));
    }
}

#[test]
fn menu_with_none_option_accepts_zero_as_sentinel() {
    let records = alpha_beta();
    let keys = ["name"];
    let menu = SelectMenu::new("pick", "id", &keys).none_option(true);

    let (choice, out) = run_menu(&menu, &records, "3\n0\n");
    assert!(out.contains("3 is not between 0 and 2"));
    let choice = choice.unwrap();
    assert_eq!(choice.raw, "0");
    assert_eq!(choice.options[0], [String::new(), "None".to_string()]);
    assert_eq!(choice.options.len(), 3);
    assert_eq!(choice.selected(), None);

    let (choice, _) = run_menu(&menu, &records, "2\n");
    assert_eq!(choice.unwrap().selected(), Some(("b", "Beta")));
}

#[test]
fn menu_end_to_end_pick_second() {
    let records = alpha_beta();
    let keys = ["name"];
    let menu = SelectMenu::new("pick", "id", &keys);

    let (choice, out) = run_menu(&menu, &records, "2\n");
    assert!(out.contains("Alpha"));
    assert!(out.contains("Beta"));
    assert!(out.contains("pick"));

    let choice = choice.unwrap();
    assert_eq!(choice.raw, "2");
    assert_eq!(
        choice.options,
        vec![
            ["a".to_string(), "Alpha".to_string()],
            ["b".to_string(), "Beta".to_string()],
        ]
    );
    assert_eq!(choice.index(), 1);
    assert_eq!(records[choice.index()]["name"], "Beta");
}

#[test]
fn menu_end_of_input_is_interrupted() {
    let records = alpha_beta();
    let keys = ["name"];
    let menu = SelectMenu::new("pick", "id", &keys);
    let mut input = Cursor::new(Vec::new());
    let mut out = Vec::new();
    let err = menu.run_with(&records, &mut input, &mut out).unwrap_err();
    assert!(matches!(err, cloudmenu::error::CliError::Interrupted));
}

#[test]
fn vultr_validator_only_checks_top_level_error() {
    let mut out = Vec::new();
    assert!(valid_response_vultr(&json!({"account": {"error": "nested is fine"}}), &mut out));
    assert!(valid_response_vultr(&json!({"info": "Successful", "status": 204}), &mut out));
    assert!(out.is_empty());

    let rejected = json!({"error": 401, "error_detail": {"error": "Invalid API token.", "status": 401}});
    assert!(!valid_response_vultr(&rejected, &mut out));
    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("401"));
    assert!(printed.contains("Invalid API token."));
}

#[test]
fn cloudflare_validator_prints_each_error() {
    let rejected = json!({
        "error": 400,
        "error_detail": {
            "success": false,
            "errors": [
                {"code": 9005, "message": "Content for A record is invalid."},
                {"code": 81057, "message": "Record already exists."},
            ],
        },
    });
    let mut out = Vec::new();
    assert!(!valid_response_cloudflare(&rejected, &mut out));
    let printed = String::from_utf8(out).unwrap();
    let error_lines: Vec<&str> = printed.lines().filter(|l| l.starts_with("  [")).collect();
    assert_eq!(
        error_lines,
        vec!["  [9005] Content for A record is invalid.", "  [81057] Record already exists."]
    );

    let mut out = Vec::new();
    assert!(valid_response_cloudflare(&json!({"success": true, "result": []}), &mut out));
}

#[test]
fn cache_round_trip_and_absent_entry() {
    let dir = TempDir::new().unwrap();
    let cache = DataCache::new(dir.path().join("data"));
    let value = json!({"plans": [{"id": "vc2-1c-1gb", "locations": ["ewr", "atl"]}], "meta": {"total": 1}});

    cache.save("vultr_plans.json", &value).unwrap();
    assert_eq!(cache.load("vultr_plans.json").unwrap(), Some(value));
    assert_eq!(cache.load("never_written.json").unwrap(), None);
}

#[test]
fn byte_sizes() {
    assert_eq!(format_bytes(1024), "1.00 KB");
    assert_eq!(format_bytes(1048576), "1.00 MB");
    assert_eq!(format_bytes(500), "500.00 bytes");
}

#[test]
fn currency() {
    let formatted = format_currency(&json!(1234.5));
    assert!(formatted.starts_with('$'));
    assert!(formatted.contains("1,234.50"));
    assert_eq!(format_currency(&json!("n/a")), "n/a");
}

#[test]
fn timestamps_in_both_wire_formats_agree() {
    let tz = FixedOffset::east_opt(2 * 3600).unwrap();
    let zulu = timestamp_in("2024-03-01T10:15:30.250Z", &tz).unwrap();
    let offset = timestamp_in("2024-03-01T12:15:30+02:00", &tz).unwrap();
    assert_eq!(zulu, offset);
    assert!(zulu.starts_with("2024-03-01 12:15:30"));
}
