// Public IP lookup through ipify, used to open the firewall for the
// operator's current address.

use reqwest::blocking::Client;
use reqwest::Method;
use std::time::Duration;

use crate::api::ApiError;

const IPV4_URL: &str = "https://api.ipify.org";
const IPV6_URL: &str = "https://api64.ipify.org";

/// IP family of a firewall rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    /// Value of Vultr's `ip_type` field.
    pub fn ip_type(self) -> &'static str {
        match self {
            IpFamily::V4 => "v4",
            IpFamily::V6 => "v6",
        }
    }

    /// Prefix length covering exactly one address.
    pub fn host_prefix(self) -> u32 {
        match self {
            IpFamily::V4 => 32,
            IpFamily::V6 => 128,
        }
    }
}

#[derive(Clone)]
pub struct Ipify {
    client: Client,
    v4_url: String,
    v6_url: String,
}

impl Ipify {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Build)?;
        Ok(Self {
            client,
            v4_url: IPV4_URL.to_string(),
            v6_url: IPV6_URL.to_string(),
        })
    }

    /// Use other lookup URLs (tests, self-hosted echo services).
    pub fn with_urls(mut self, v4_url: impl Into<String>, v6_url: impl Into<String>) -> Self {
        self.v4_url = v4_url.into();
        self.v6_url = v6_url.into();
        self
    }

    /// The public address this machine is seen from.
    pub fn public_ip(&self, family: IpFamily) -> Result<String, ApiError> {
        let url = match family {
            IpFamily::V4 => &self.v4_url,
            IpFamily::V6 => &self.v6_url,
        };
        self.client
            .get(url)
            .send()
            .and_then(|res| res.error_for_status())
            .and_then(|res| res.text())
            .map(|text| text.trim().to_string())
            .map_err(|source| ApiError::Transport {
                method: Method::GET,
                url: url.clone(),
                transient: source.is_timeout() || source.is_connect(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::serve;

    #[test]
    fn test_public_ip_trims_body() {
        let (base, _seen) = serve(vec![(200, "198.51.100.23\n"), (200, "2001:db8::5")]);
        let ipify = Ipify::new(Duration::from_secs(5))
            .unwrap()
            .with_urls(base.clone(), base);
        assert_eq!(ipify.public_ip(IpFamily::V4).unwrap(), "198.51.100.23");
        assert_eq!(ipify.public_ip(IpFamily::V6).unwrap(), "2001:db8::5");
    }

    #[test]
    fn test_public_ip_error_status() {
        let (base, _seen) = serve(vec![(503, "")]);
        let ipify = Ipify::new(Duration::from_secs(5))
            .unwrap()
            .with_urls(base.clone(), base);
        assert!(ipify.public_ip(IpFamily::V4).is_err());
    }

    #[test]
    fn test_family_fields() {
        assert_eq!(IpFamily::V4.ip_type(), "v4");
        assert_eq!(IpFamily::V6.host_prefix(), 128);
    }
}
