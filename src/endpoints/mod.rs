// Resource flows built on the HTTP wrapper, validators, cache and selection
// menu. Each submodule exposes plain functions taking the shared
// [`Context`] and the operator's [`Session`](crate::session::Session).

pub mod account;
pub mod application;
pub mod firewall;
pub mod instance;
pub mod ipify;
pub mod os;
pub mod plan;
pub mod region;
pub mod snapshot;
pub mod zone;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::io;

use crate::api::{ApiClient, ApiError, Provider};
use crate::cache::DataCache;
use crate::config::{Credentials, Settings};
use crate::error::Result;
use crate::models::decode_list;
use crate::output::yellow;
use crate::select::SelectMenu;
use crate::session::Selection;
use crate::validate::{valid_response_cloudflare, valid_response_vultr};

use self::ipify::Ipify;

/// Default note and comment stamped on resources this tool creates.
pub const CREATED_BY: &str = "Added by cloudmenu";

/// Everything an endpoint needs besides the selection state.
pub struct Context {
    pub vultr: ApiClient,
    pub cloudflare: ApiClient,
    pub ipify: Ipify,
    pub cache: DataCache,
    pub settings: Settings,
    pub cloudflare_email: String,
}

impl Context {
    pub fn new(settings: Settings, credentials: &Credentials) -> std::result::Result<Self, ApiError> {
        let timeout = settings.request_timeout();
        let vultr = ApiClient::new(Provider::Vultr, &credentials.vultr_api_key, timeout)?
            .with_response_summary(settings.print_api_response);
        let cloudflare = ApiClient::new(Provider::Cloudflare, &credentials.cloudflare_api_key, timeout)?
            .with_response_summary(settings.print_api_response);
        Ok(Self {
            vultr,
            cloudflare,
            ipify: Ipify::new(timeout)?,
            cache: DataCache::new(settings.cache_dir.clone()),
            settings,
            cloudflare_email: credentials.cloudflare_email.clone(),
        })
    }

    /// Selection menu honoring the timestamp toggle.
    pub fn menu<'a>(&self, prompt: &'a str, value_key: &'a str, display_keys: &'a [&'a str]) -> SelectMenu<'a> {
        SelectMenu::new(prompt, value_key, display_keys).show_timestamp(self.settings.print_timestamp)
    }

    pub fn vultr_get(&self, path: &str) -> Result<Option<Value>> {
        checked(Provider::Vultr, self.vultr.get(path)?)
    }

    pub fn vultr_post(&self, path: &str, body: &Value) -> Result<Option<Value>> {
        checked(Provider::Vultr, self.vultr.post(path, body)?)
    }

    pub fn vultr_put(&self, path: &str, body: &Value) -> Result<Option<Value>> {
        checked(Provider::Vultr, self.vultr.put(path, body)?)
    }

    pub fn vultr_patch(&self, path: &str, body: &Value) -> Result<Option<Value>> {
        checked(Provider::Vultr, self.vultr.patch(path, body)?)
    }

    pub fn vultr_delete(&self, path: &str) -> Result<Option<Value>> {
        checked(Provider::Vultr, self.vultr.delete(path)?)
    }

    pub fn cf_get(&self, path: &str) -> Result<Option<Value>> {
        checked(Provider::Cloudflare, self.cloudflare.get(path)?)
    }

    pub fn cf_post(&self, path: &str, body: &Value) -> Result<Option<Value>> {
        checked(Provider::Cloudflare, self.cloudflare.post(path, body)?)
    }

    pub fn cf_put(&self, path: &str, body: &Value) -> Result<Option<Value>> {
        checked(Provider::Cloudflare, self.cloudflare.put(path, body)?)
    }

    pub fn cf_delete(&self, path: &str) -> Result<Option<Value>> {
        checked(Provider::Cloudflare, self.cloudflare.delete(path)?)
    }

    /// Load a cached list endpoint, fetching it on the first miss.
    pub(crate) fn cached_list<T: DeserializeOwned>(
        &self,
        file: &str,
        path: &str,
        key: &str,
        label: &str,
    ) -> Result<Vec<T>> {
        match self.cache.load_or_fetch(file, label, || self.vultr_get(path))? {
            Some(data) => decode_list(&data, key),
            None => Ok(Vec::new()),
        }
    }

    /// Re-fetch a list endpoint and overwrite its cache file.
    pub(crate) fn refresh_cache(&self, file: &str, path: &str, label: &str) -> Result<()> {
        if let Some(data) = self.vultr_get(path)? {
            println!("Saving {} data", label);
            self.cache.save(file, &data)?;
        }
        Ok(())
    }
}

/// Run the provider's validator; `None` means the call was rejected and the
/// diagnostic has been printed.
fn checked(provider: Provider, data: Value) -> Result<Option<Value>> {
    let mut out = io::stdout();
    let ok = match provider {
        Provider::Vultr => valid_response_vultr(&data, &mut out),
        Provider::Cloudflare => valid_response_cloudflare(&data, &mut out),
    };
    Ok(ok.then_some(data))
}

/// Show a selection menu and turn the answer into a [`Selection`]; `None`
/// for the "None" entry or an empty list.
pub(crate) fn pick<T: Serialize>(menu: SelectMenu<'_>, records: &[T]) -> Result<Option<Selection>> {
    let choice = menu.run(records)?;
    Ok(choice
        .as_ref()
        .and_then(|c| c.selected())
        .map(|(id, desc)| Selection::new(id, desc)))
}

/// Keep `records` whose id appears in `preferred`, in preference order.
pub(crate) fn preferred<T, K, F>(records: &[T], preferred: &[K], id_of: F) -> Vec<T>
where
    T: Clone,
    K: PartialEq,
    F: Fn(&T) -> K,
{
    preferred
        .iter()
        .filter_map(|want| records.iter().find(|r| id_of(r) == *want).cloned())
        .collect()
}

/// Print the standard warning for an empty selection slot.
pub(crate) fn not_selected(what: &str) {
    println!("{}", yellow(&format!("No {} Selected!", what)));
}

/// Print the `status: info` line Vultr returns for bodiless replies.
pub(crate) fn print_status_info(data: &Value) {
    let status = data.get("status").map(crate::format::value_to_string).unwrap_or_default();
    let info = data.get("info").map(crate::format::value_to_string).unwrap_or_default();
    println!(" {}: {}", status, info);
}


#[cfg(test)]
mod tests {
    use super::testing::context;
    use super::*;
    use crate::api::test_server::serve;
    use crate::cache::REGIONS;
    use crate::models::Region;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_preferred_keeps_preference_order() {
        let records = vec![("a", 1), ("b", 2), ("c", 3)];
        let picked = preferred(&records, &["c", "x", "a"], |r| r.0);
        assert_eq!(picked, vec![("c", 3), ("a", 1)]);
    }

    #[test]
    fn test_checked_rejects_error_mapping() {
        let data = json!({"error": 401, "error_detail": {"error": "Invalid API token."}});
        assert_eq!(checked(Provider::Vultr, data).unwrap(), None);
        let ok = json!({"account": {}});
        assert_eq!(checked(Provider::Vultr, ok.clone()).unwrap(), Some(ok));
    }

    #[test]
    fn test_cached_list_fetches_once() {
        let (base, seen) = serve(vec![(200, r#"{"regions":[{"id":"ewr","city":"New Jersey"}]}"#)]);
        let dir = TempDir::new().unwrap();
        let ctx = context(&base, &dir);

        let first: Vec<Region> = ctx.cached_list(REGIONS, "regions", "regions", "regions").unwrap();
        let second: Vec<Region> = ctx.cached_list(REGIONS, "regions", "regions", "regions").unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second[0].city, "New Jersey");
        assert_eq!(seen.recv().unwrap().request_line, "GET /regions HTTP/1.1");
        assert!(seen.try_recv().is_err());
    }

    #[test]
    fn test_refresh_cache_skips_rejected_response() {
        let (base, _seen) = serve(vec![(403, r#"{"error":"Unauthorized IP address"}"#)]);
        let dir = TempDir::new().unwrap();
        let ctx = context(&base, &dir);
        ctx.refresh_cache(REGIONS, "regions", "regions").unwrap();
        assert!(!ctx.cache.path_for(REGIONS).exists());
    }
}
