//! Handle → SID and SID → hosting-server-URL resolution (§4.2, §6
//! Boundary 1).

use std::time::Duration;

use ar_domain::{Config, Error, Handle, Result, Sid};
use serde::Deserialize;

use crate::cache::ResolutionCache;

const PDS_SERVICE_TYPE: &str = "AtprotoPersonalDataServer";
const PDS_SERVICE_ID_SUFFIX: &str = "#atproto_pds";

pub struct IdentityResolver {
    client: reqwest::Client,
    resolvers: Vec<String>,
    plc_directory: String,
    timeout: Duration,
    cache: ResolutionCache,
}

#[derive(Debug, Deserialize)]
struct ResolveHandleResponse {
    did: String,
}

#[derive(Debug, Deserialize)]
struct DidDocument {
    #[serde(default, rename = "alsoKnownAs")]
    also_known_as: Vec<String>,
    #[serde(default)]
    service: Vec<ServiceEntry>,
}

#[derive(Debug, Deserialize)]
struct ServiceEntry {
    id: String,
    #[serde(rename = "type")]
    type_: String,
    #[serde(rename = "serviceEndpoint")]
    service_endpoint: String,
}

impl IdentityResolver {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.http.user_agent.clone())
            .timeout(Duration::from_secs(config.identity.timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("building http client: {e}")))?;

        Ok(Self {
            client,
            resolvers: config.identity.resolvers.clone(),
            plc_directory: config.identity.plc_directory.clone(),
            timeout: Duration::from_secs(config.identity.timeout_secs),
            cache: ResolutionCache::new(config.identity.cache_ttl_hours),
        })
    }

    /// Resolve an account string that may already be an SID, or a handle
    /// that needs resolving.
    pub async fn resolve(&self, account: &str) -> Result<Sid> {
        if Sid::looks_like_sid(account) {
            return Sid::parse(account);
        }
        let handle = Handle::parse(account)?;
        self.resolve_handle(&handle).await
    }

    pub async fn resolve_handle(&self, handle: &Handle) -> Result<Sid> {
        let now = now_unix();
        if let Some(sid) = self.cache.get(handle.as_str(), now) {
            return Ok(sid);
        }

        let mut reasons = Vec::new();
        for resolver in &self.resolvers {
            let url = format!(
                "{resolver}/xrpc/com.atproto.identity.resolveHandle?handle={}",
                handle.as_str()
            );
            match self.try_resolve_handle_at(&url).await {
                Ok(sid) => {
                    self.cache.put(handle.as_str().to_string(), sid.clone(), now);
                    return Ok(sid);
                }
                Err(reason) => reasons.push(format!("{resolver}: {reason}")),
            }
        }

        Err(Error::DidResolveFailed(format!(
            "could not resolve handle \"{handle}\" against any resolver: {}",
            reasons.join("; ")
        )))
    }

    async fn try_resolve_handle_at(&self, url: &str) -> std::result::Result<Sid, String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status()));
        }
        let body: ResolveHandleResponse = resp.json().await.map_err(|e| e.to_string())?;
        Sid::parse(&body.did).map_err(|e| e.to_string())
    }

    /// Resolve a SID to its hosting server's base URL.
    pub async fn resolve_hosting_url(&self, sid: &Sid) -> Result<String> {
        if sid.is_did_plc() {
            let url = format!("{}/{}", self.plc_directory.trim_end_matches('/'), sid);
            let doc = self.fetch_did_document(&url).await?;
            return pds_endpoint_from_doc(&doc, sid);
        }

        if sid.is_did_web() {
            let (host, path) = sid
                .did_web_host_path()
                .ok_or_else(|| Error::DidResolveFailed(format!("malformed did:web SID: {sid}")))?;
            let mut candidates = vec![format!("https://{host}/.well-known/did.json")];
            if !path.is_empty() {
                candidates.push(format!("https://{host}/{}/did.json", path.join("/")));
            }

            let mut reasons = Vec::new();
            for url in candidates {
                match self.fetch_did_document(&url).await {
                    Ok(doc) => return pds_endpoint_from_doc(&doc, sid),
                    Err(e) => reasons.push(format!("{url}: {e}")),
                }
            }
            return Err(Error::DidResolveFailed(format!(
                "could not fetch did:web document for {sid}: {}",
                reasons.join("; ")
            )));
        }

        Err(Error::InvalidInput(format!("unsupported SID form: {sid}")))
    }

    async fn fetch_did_document(&self, url: &str) -> Result<DidDocument> {
        let resp = tokio::time::timeout(self.timeout, self.client.get(url).send())
            .await
            .map_err(|_| Error::Timeout(format!("fetching DID document from {url}")))?
            .map_err(|e| Error::DidResolveFailed(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Error::DidResolveFailed(format!(
                "HTTP {} fetching {url}",
                resp.status()
            )));
        }
        resp.json()
            .await
            .map_err(|e| Error::DidResolveFailed(format!("parsing DID document from {url}: {e}")))
    }

    /// Bidirectional check: fetch the SID's document and confirm one of
    /// its `alsoKnownAs` entries names this handle.
    pub async fn verify_handle(&self, sid: &Sid, handle: &Handle) -> Result<bool> {
        let doc_url = if sid.is_did_plc() {
            format!("{}/{}", self.plc_directory.trim_end_matches('/'), sid)
        } else {
            let (host, _) = sid
                .did_web_host_path()
                .ok_or_else(|| Error::DidResolveFailed(format!("malformed did:web SID: {sid}")))?;
            format!("https://{host}/.well-known/did.json")
        };
        let doc = self.fetch_did_document(&doc_url).await?;
        let expected = format!("at://{handle}");
        Ok(doc.also_known_as.iter().any(|aka| aka == &expected))
    }

    pub fn cleanup(&self) {
        self.cache.cleanup(now_unix());
    }

    pub fn cached_entry_count(&self) -> usize {
        self.cache.len()
    }
}

fn pds_endpoint_from_doc(doc: &DidDocument, sid: &Sid) -> Result<String> {
    doc.service
        .iter()
        .find(|s| s.type_ == PDS_SERVICE_TYPE || s.id.ends_with(PDS_SERVICE_ID_SUFFIX))
        .map(|s| s.service_endpoint.clone())
        .ok_or_else(|| {
            Error::DidResolveFailed(format!(
                "no {PDS_SERVICE_TYPE} service entry in DID document for {sid}"
            ))
        })
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_with_resolver(resolver_url: &str) -> Config {
        let mut config = Config::default();
        config.identity.resolvers = vec![resolver_url.to_string()];
        config.identity.plc_directory = resolver_url.to_string();
        config
    }

    #[tokio::test]
    async fn resolve_handle_returns_sid_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/xrpc/com.atproto.identity.resolveHandle"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "did": "did:plc:5cajdgeo6qz32kptlpg4c3lv" })),
            )
            .mount(&server)
            .await;

        let resolver = IdentityResolver::new(&config_with_resolver(&server.uri())).unwrap();
        let handle = Handle::parse("alice.example").unwrap();
        let sid = resolver.resolve_handle(&handle).await.unwrap();
        assert_eq!(sid.as_str(), "did:plc:5cajdgeo6qz32kptlpg4c3lv");
    }

    #[tokio::test]
    async fn resolve_handle_caches_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/xrpc/com.atproto.identity.resolveHandle"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "did": "did:plc:5cajdgeo6qz32kptlpg4c3lv" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let resolver = IdentityResolver::new(&config_with_resolver(&server.uri())).unwrap();
        let handle = Handle::parse("alice.example").unwrap();
        resolver.resolve_handle(&handle).await.unwrap();
        let sid = resolver.resolve_handle(&handle).await.unwrap();
        assert_eq!(sid.as_str(), "did:plc:5cajdgeo6qz32kptlpg4c3lv");
        assert_eq!(resolver.cached_entry_count(), 1);
    }

    #[tokio::test]
    async fn resolve_handle_fails_with_aggregate_reason_when_all_resolvers_fail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/xrpc/com.atproto.identity.resolveHandle"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let resolver = IdentityResolver::new(&config_with_resolver(&server.uri())).unwrap();
        let handle = Handle::parse("alice.example").unwrap();
        let err = resolver.resolve_handle(&handle).await.unwrap_err();
        assert_eq!(err.kind(), "DIDResolveFailed");
    }

    #[tokio::test]
    async fn resolve_returns_parsed_sid_without_network_when_already_an_sid() {
        let resolver =
            IdentityResolver::new(&config_with_resolver("http://127.0.0.1:1")).unwrap();
        let sid = resolver
            .resolve("did:plc:5cajdgeo6qz32kptlpg4c3lv")
            .await
            .unwrap();
        assert_eq!(sid.as_str(), "did:plc:5cajdgeo6qz32kptlpg4c3lv");
    }

    #[tokio::test]
    async fn resolve_hosting_url_for_did_plc_selects_pds_service() {
        let server = MockServer::start().await;
        let sid = "did:plc:5cajdgeo6qz32kptlpg4c3lv";
        Mock::given(method("GET"))
            .and(path(format!("/{sid}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "alsoKnownAs": ["at://alice.example"],
                "service": [
                    { "id": "#atproto_pds", "type": "AtprotoPersonalDataServer", "serviceEndpoint": "https://pds.example" },
                    { "id": "#other", "type": "SomethingElse", "serviceEndpoint": "https://ignored.example" },
                ],
            })))
            .mount(&server)
            .await;

        let resolver = IdentityResolver::new(&config_with_resolver(&server.uri())).unwrap();
        let sid = Sid::parse(sid).unwrap();
        let endpoint = resolver.resolve_hosting_url(&sid).await.unwrap();
        assert_eq!(endpoint, "https://pds.example");
    }

    #[tokio::test]
    async fn verify_handle_checks_also_known_as() {
        let server = MockServer::start().await;
        let sid_str = "did:plc:5cajdgeo6qz32kptlpg4c3lv";
        Mock::given(method("GET"))
            .and(path(format!("/{sid_str}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "alsoKnownAs": ["at://alice.example"],
                "service": [],
            })))
            .mount(&server)
            .await;

        let resolver = IdentityResolver::new(&config_with_resolver(&server.uri())).unwrap();
        let sid = Sid::parse(sid_str).unwrap();
        let matching = Handle::parse("alice.example").unwrap();
        let mismatching = Handle::parse("bob.example").unwrap();
        assert!(resolver.verify_handle(&sid, &matching).await.unwrap());
        assert!(!resolver.verify_handle(&sid, &mismatching).await.unwrap());
    }
}
