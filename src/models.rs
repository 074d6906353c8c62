// Typed views of the provider records the tool displays or acts on.
//
// Every field defaults when absent so sparse responses still decode;
// money amounts stay as raw JSON because providers send them as numbers or
// strings depending on the endpoint.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CliError, Result};

/// Decode `data[key]` into `T`.
pub fn decode<T: DeserializeOwned>(data: &Value, key: &str) -> Result<T> {
    let field = data.get(key).cloned().unwrap_or(Value::Null);
    serde_json::from_value(field).map_err(|e| CliError::decode(key, e))
}

/// Decode `data[key]` as a list, treating a missing key as empty.
pub fn decode_list<T: DeserializeOwned>(data: &Value, key: &str) -> Result<Vec<T>> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(list) => serde_json::from_value(list.clone()).map_err(|e| CliError::decode(key, e)),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub name: String,
    pub email: String,
    pub balance: Value,
    pub pending_charges: Value,
    pub last_payment_date: String,
    pub last_payment_amount: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Instance {
    pub id: String,
    pub label: String,
    pub hostname: String,
    pub tags: Vec<String>,
    pub region: String,
    pub date_created: String,
    pub plan: String,
    pub os: String,
    pub os_id: u64,
    pub app_id: u64,
    pub vcpu_count: u64,
    pub ram: u64,
    pub disk: u64,
    pub allowed_bandwidth: u64,
    pub main_ip: String,
    pub v6_main_ip: String,
    pub firewall_group_id: String,
    pub status: String,
    pub power_status: String,
    pub server_status: String,
    pub features: Vec<String>,
    pub user_scheme: String,
    pub pending_charges: Value,
}

/// Resources carrying this tag are never deleted.
pub const PRODUCTION_TAG: &str = "prod";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FirewallGroup {
    pub id: String,
    pub description: String,
    pub date_created: String,
    pub date_modified: String,
    pub instance_count: u64,
    pub rule_count: u64,
    pub max_rule_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirewallRule {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub ip_type: String,
    pub action: String,
    pub protocol: String,
    pub port: String,
    pub subnet: String,
    pub subnet_size: u32,
    pub source: String,
    pub notes: String,
}

impl FirewallRule {
    /// `subnet/size` as shown in rule tables.
    pub fn cidr(&self) -> String {
        format!("{}/{}", self.subnet, self.subnet_size)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub id: String,
    pub date_created: String,
    pub description: String,
    pub size: u64,
    pub compressed_size: u64,
    pub status: String,
    pub os_id: u64,
    pub app_id: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Plan {
    pub id: String,
    pub vcpu_count: u64,
    pub ram: u64,
    pub disk: u64,
    pub disk_count: u64,
    pub bandwidth: u64,
    pub monthly_cost: Value,
    #[serde(rename = "type")]
    pub kind: String,
    pub locations: Vec<String>,
}

impl Plan {
    pub fn available_in(&self, region_id: &str) -> bool {
        self.locations.iter().any(|l| l == region_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Region {
    pub id: String,
    pub city: String,
    pub country: String,
    pub continent: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatingSystem {
    pub id: u64,
    pub name: String,
    pub arch: String,
    pub family: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Application {
    pub id: u64,
    pub name: String,
    pub short_name: String,
    pub deploy_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub vendor: String,
    pub image_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Zone {
    pub id: String,
    pub name: String,
    pub status: String,
    pub paused: bool,
    pub name_servers: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsRecord {
    pub id: String,
    pub zone_id: String,
    pub zone_name: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub proxied: bool,
    pub ttl: u64,
    pub comment: Option<String>,
}
