// Menu driver: a flat loop over screens. Each screen is a numbered option
// list; an option either moves to another screen or runs an endpoint
// operation and stays put. Nothing recurses, so long sessions keep a
// constant stack.

use anyhow::Result;
use tracing::error;

use crate::endpoints::ipify::IpFamily;
use crate::endpoints::{account, application, firewall, instance, os, plan, region, snapshot, zone, Context};
use crate::error::CliError;
use crate::output::{red, yellow};
use crate::select::{numbered, text_prompt};
use crate::session::Session;

type Operation = fn(&Context, &mut Session) -> crate::error::Result<()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Main,
    Account,
    Instance,
    Firewall,
    Snapshot,
    Region,
    Plan,
    Os,
    Application,
    Dns,
    Exit,
}

#[derive(Clone, Copy)]
pub enum Action {
    Go(Screen),
    Run(Operation),
}

impl Screen {
    pub fn title(self) -> &'static str {
        match self {
            Screen::Main => "Main Menu",
            Screen::Account => "Account",
            Screen::Instance => "Instances",
            Screen::Firewall => "Firewalls",
            Screen::Snapshot => "Snapshots",
            Screen::Region => "Regions",
            Screen::Plan => "Plans",
            Screen::Os => "Operating Systems",
            Screen::Application => "Applications",
            Screen::Dns => "DNS",
            Screen::Exit => "Exit",
        }
    }

    /// Numbered options of this screen, in display order.
    pub fn entries(self) -> Vec<(&'static str, Action)> {
        use Action::{Go, Run};
        let back = ("Go Back", Go(Screen::Main));
        match self {
            Screen::Main => vec![
                ("Account", Go(Screen::Account)),
                ("Instances", Go(Screen::Instance)),
                ("Firewalls", Go(Screen::Firewall)),
                ("Snapshots", Go(Screen::Snapshot)),
                ("Regions", Go(Screen::Region)),
                ("Plans", Go(Screen::Plan)),
                ("Operating Systems", Go(Screen::Os)),
                ("Applications", Go(Screen::Application)),
                ("DNS", Go(Screen::Dns)),
                ("Exit", Go(Screen::Exit)),
            ],
            Screen::Account => vec![
                ("Show Account Details", Run(|c, _| account::show(c))),
                back,
            ],
            Screen::Instance => vec![
                ("Select Instance", Run(instance::select)),
                ("Show Instance", Run(|c, s| instance::show(c, s))),
                ("Create Instance", Run(instance::create_prompt)),
                ("Delete Instance", Run(instance::delete)),
                ("Update Firewall", Run(instance::update_firewall)),
                ("Create/Update DNS A Record", Run(|c, s| instance::dns_from_hostname(c, s, IpFamily::V4))),
                ("Create/Update DNS AAAA Record", Run(|c, s| instance::dns_from_hostname(c, s, IpFamily::V6))),
                ("Delete DNS A Record", Run(|c, s| instance::delete_dns(c, s, IpFamily::V4))),
                ("Delete DNS AAAA Record", Run(|c, s| instance::delete_dns(c, s, IpFamily::V6))),
                ("Snapshot Instance", Run(snapshot_create)),
                back,
            ],
            Screen::Firewall => vec![
                ("Select Firewall", Run(|c, s| firewall::select(c, s).map(|_| ()))),
                ("Show Firewall", Run(|c, s| firewall::show(c, s))),
                ("Create Firewall", Run(firewall::create_prompt)),
                ("Delete Firewall", Run(firewall::delete)),
                ("Show Firewall Rules", Run(firewall::show_rules)),
                ("Add My IPv4 Address", Run(|c, s| firewall::add_my_ip(c, s, IpFamily::V4))),
                ("Add My IPv6 Address", Run(|c, s| firewall::add_my_ip(c, s, IpFamily::V6))),
                ("Delete Rules by Notes", Run(firewall::delete_rules_by_note)),
                ("Delete All Rules", Run(firewall::delete_all_rules)),
                back,
            ],
            Screen::Snapshot => vec![
                ("Select Snapshot", Run(|c, s| snapshot::select(c, s).map(|_| ()))),
                ("Show Snapshot", Run(|c, s| snapshot::show(c, s))),
                ("Rename Snapshot", Run(snapshot_rename)),
                ("Delete Snapshot", Run(snapshot::delete)),
                back,
            ],
            Screen::Region => vec![
                ("Select Region", Run(region::select_all)),
                ("Select Preferred Region", Run(region::select_preferred)),
                ("Show Region", Run(|c, s| region::show(c, s))),
                ("Save Regions", Run(|c, _| region::save(c))),
                back,
            ],
            Screen::Plan => vec![
                ("Select Plan", Run(|c, s| plan::select_region_plans(c, s, true))),
                ("Select Preferred Plan", Run(|c, s| plan::select_preferred_region_plans(c, s, true))),
                ("Show Plan", Run(|c, s| plan::show(c, s))),
                ("Save Plans", Run(|c, _| plan::save(c))),
                back,
            ],
            Screen::Os => vec![
                ("Select OS", Run(os::select_all)),
                ("Select Preferred OS", Run(os::select_preferred)),
                ("Show OS", Run(|c, s| os::show(c, s))),
                ("Save Operating Systems", Run(|c, _| os::save(c))),
                back,
            ],
            Screen::Application => vec![
                ("Select Application", Run(application::select_all)),
                ("Select Preferred Application", Run(application::select_preferred)),
                ("Show Application", Run(|c, s| application::show(c, s))),
                ("Save Applications", Run(|c, _| application::save(c))),
                back,
            ],
            Screen::Dns => vec![
                ("Verify Token", Run(|c, _| zone::verify_token(c))),
                ("Select Zone", Run(|c, s| zone::select(c, s).map(|_| ()))),
                ("Show DNS Records", Run(|c, s| zone::show_records(c, s))),
                ("Select DNS Record", Run(zone::select_record)),
                ("Delete DNS Record", Run(zone::delete_record)),
                back,
            ],
            Screen::Exit => Vec::new(),
        }
    }
}

fn snapshot_create(ctx: &Context, session: &mut Session) -> crate::error::Result<()> {
    let description = text_prompt("Snapshot description?")?;
    snapshot::create(ctx, session, &description)
}

fn snapshot_rename(ctx: &Context, session: &mut Session) -> crate::error::Result<()> {
    let description = text_prompt("New snapshot description?")?;
    snapshot::update(ctx, session, &description)
}

/// Main interactive loop. Returns when the operator picks "Exit".
pub fn main_menu(ctx: &Context) -> Result<()> {
    let mut session = Session::new();
    let mut screen = Screen::Main;
    while screen != Screen::Exit {
        screen = step(ctx, &mut session, screen)?;
    }
    Ok(())
}

fn step(ctx: &Context, session: &mut Session, screen: Screen) -> Result<Screen> {
    println!();
    println!("== {} ==", screen.title());
    let summary = session.summary();
    if !summary.is_empty() {
        println!("{}", summary);
    }

    let entries = screen.entries();
    let labels: Vec<&str> = entries.iter().map(|(label, _)| *label).collect();
    let menu = ctx.menu("What area?: ", "id", &["name"]);
    let Some(choice) = menu.run(&numbered(&labels))? else {
        return Ok(Screen::Main);
    };

    match entries[choice.index()].1 {
        Action::Go(next) => Ok(next),
        Action::Run(operation) => {
            if let Err(err) = operation(ctx, session) {
                report(&err);
            }
            Ok(screen)
        }
    }
}

/// Print a failed operation and keep the session going.
fn report(err: &CliError) {
    error!(error = ?err, "operation failed");
    match err {
        CliError::Api(api) if api.is_transient() => {
            println!("{}", yellow(&format!("{} (network problem, try again)", api)));
        }
        _ => println!("{}", red(&err.to_string())),
    }
}
