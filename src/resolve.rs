//! Handle resolution
//!
//! Turning a raw `at://` URI into a human-readable URL needs one outbound
//! lookup: DID to handle. The lookup is injected as a capability so URL
//! building stays testable without the network, and resolution failure is
//! the one recoverable error in this crate — callers may proceed without a
//! handle.

use crate::{Error, Result};

/// Default identity-resolution service
pub const DEFAULT_SERVICE_URL: &str = "https://bsky.social";

/// Anything that can turn a DID into a handle
pub trait HandleResolver {
    fn resolve_handle(&self, did: &str) -> Result<String>;
}

#[cfg(feature = "resolve")]
#[derive(serde::Deserialize)]
struct ResolveResponse {
    handle: Option<String>,
}

/// Resolver backed by the XRPC identity endpoint
#[cfg(feature = "resolve")]
pub struct HttpResolver {
    service_url: String,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "resolve")]
impl HttpResolver {
    /// Create a resolver against a specific service
    pub fn new(service_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(HttpResolver {
            service_url: service_url.into(),
            client,
        })
    }

    /// Create a resolver against the default service
    pub fn default_service() -> Result<Self> {
        Self::new(DEFAULT_SERVICE_URL)
    }
}

#[cfg(feature = "resolve")]
impl HandleResolver for HttpResolver {
    fn resolve_handle(&self, did: &str) -> Result<String> {
        let url = format!(
            "{}/xrpc/app.bsky.identity.resolveHandle",
            self.service_url.trim_end_matches('/')
        );
        let response = self
            .client
            .get(&url)
            .query(&[("did", did)])
            .send()
            .map_err(|e| Error::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Resolution(format!(
                "failed to resolve {did}: HTTP {}",
                response.status()
            )));
        }

        let body: ResolveResponse = response.json().map_err(|e| Error::Http(e.to_string()))?;
        body.handle
            .ok_or_else(|| Error::Resolution(format!("no handle in response for {did}")))
    }
}

/// Build the public profile URL for an `at://` record URI
pub fn profile_url_from_uri(uri: &str, resolver: &dyn HandleResolver) -> Result<String> {
    let (did, rkey) = split_uri(uri)?;
    let handle = resolver.resolve_handle(did)?;
    Ok(format!("https://bsky.app/profile/{handle}/post/{rkey}"))
}

/// Split an `at://did/collection/rkey` URI into its DID and record key
fn split_uri(uri: &str) -> Result<(&str, &str)> {
    let parts: Vec<&str> = uri.split('/').collect();
    if parts.len() < 4 || parts[2].is_empty() {
        return Err(Error::Resolution(format!("malformed AT URI: {uri}")));
    }
    let did = parts[2];
    let rkey = parts[parts.len() - 1];
    Ok((did, rkey))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedResolver(&'static str);

    impl HandleResolver for FixedResolver {
        fn resolve_handle(&self, _did: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingResolver;

    impl HandleResolver for FailingResolver {
        fn resolve_handle(&self, did: &str) -> Result<String> {
            Err(Error::Resolution(format!("failed to resolve {did}")))
        }
    }

    #[test]
    fn test_split_uri() {
        let uri = "at://did:plc:ewvi7nxzyoun6zhxrhs64oiz/app.bsky.feed.post/3k44deefqdk2g";
        let (did, rkey) = split_uri(uri).unwrap();
        assert_eq!(did, "did:plc:ewvi7nxzyoun6zhxrhs64oiz");
        assert_eq!(rkey, "3k44deefqdk2g");
    }

    #[test]
    fn test_malformed_uri_rejected() {
        assert!(split_uri("not-a-uri").is_err());
        assert!(split_uri("at:///app.bsky.feed.post/abc").is_err());
    }

    #[test]
    fn test_profile_url() {
        let uri = "at://did:plc:ewvi7nxzyoun6zhxrhs64oiz/app.bsky.feed.post/3k44deefqdk2g";
        let url = profile_url_from_uri(uri, &FixedResolver("alice.example.com")).unwrap();
        assert_eq!(
            url,
            "https://bsky.app/profile/alice.example.com/post/3k44deefqdk2g"
        );
    }

    #[test]
    fn test_resolution_failure_propagates() {
        let uri = "at://did:plc:unknown/app.bsky.feed.post/abc";
        assert!(matches!(
            profile_url_from_uri(uri, &FailingResolver),
            Err(Error::Resolution(_))
        ));
    }
}
