// Per-session selection state.
//
// One `Session` lives for the whole interactive run and is passed `&mut` to
// every endpoint operation. A slot holding an id only promises that the
// record existed at the last list fetch.

use crate::models::{FirewallRule, PRODUCTION_TAG};

/// A chosen record: its identifier and a human readable description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub id: String,
    pub desc: String,
}

impl Selection {
    pub fn new(id: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            desc: desc.into(),
        }
    }
}

/// Details kept about the selected instance for follow-up actions.
#[derive(Debug, Clone, Default)]
pub struct InstanceSelection {
    pub selection: Selection,
    pub tags: Vec<String>,
    pub hostname: String,
    pub ip4: String,
    pub ip6: String,
}

impl InstanceSelection {
    pub fn is_production(&self) -> bool {
        self.tags.iter().any(|t| t == PRODUCTION_TAG)
    }
}

/// Firewall group plus the rules fetched with it.
#[derive(Debug, Clone, Default)]
pub struct FirewallSelection {
    pub selection: Selection,
    pub rules: Vec<FirewallRule>,
}

#[derive(Debug, Clone, Default)]
pub struct ApplicationSelection {
    pub selection: Selection,
    pub image_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub instance: Option<InstanceSelection>,
    pub firewall: Option<FirewallSelection>,
    pub snapshot: Option<Selection>,
    pub region: Option<Selection>,
    pub plan: Option<Selection>,
    pub os: Option<Selection>,
    pub application: Option<ApplicationSelection>,
    pub zone: Option<Selection>,
    pub dns_record: Option<Selection>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// One-line summary of the current selections for menu headings.
    pub fn summary(&self) -> String {
        fn part(label: &str, sel: Option<&Selection>) -> Option<String> {
            sel.map(|s| format!("{}: {}", label, s.desc))
        }
        [
            part("Instance", self.instance.as_ref().map(|i| &i.selection)),
            part("Firewall", self.firewall.as_ref().map(|f| &f.selection)),
            part("Snapshot", self.snapshot.as_ref()),
            part("Region", self.region.as_ref()),
            part("Plan", self.plan.as_ref()),
            part("OS", self.os.as_ref()),
            part("App", self.application.as_ref().map(|a| &a.selection)),
            part("Zone", self.zone.as_ref()),
            part("DNS", self.dns_record.as_ref()),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" | ")
    }
}
