//! `PdsClient`: a typed `reqwest` wrapper over the hosting-server HTTP
//! surface (§6 Boundary 1) — reads (`getRecord`, `getPostThread`,
//! `getFeed`) and the write path (`createRecord`, `deleteRecord`) that
//! spec.md's Non-goals explicitly keep out of the repository data plane
//! (writes go straight to the PDS, never re-signing local archive
//! state).

use std::time::Duration;

use ar_domain::{Error, Result};
use reqwest::StatusCode;

use crate::types::{
    CreateRecordRequest, CreateRecordResponse, CreateSessionRequest, CreateSessionResponse,
    DeleteRecordRequest, GetFeedResponse, GetPostThreadResponse, GetRecordResponse,
    ThreadViewNode,
};

/// A client bound to one hosting server and (optionally) one
/// authenticated session. Cheap to construct per call the way
/// `RestSerialMemoryClient` is built from its config section — the
/// hosting server and bearer token vary per account, so nothing here is
/// shared process-wide the way the identity resolver's HTTP client is.
pub struct PdsClient {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl PdsClient {
    pub fn new(base_url: &str, access_token: Option<String>, user_agent: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Internal(format!("building http client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    fn url(&self, xrpc_method: &str) -> String {
        format!("{}/xrpc/{xrpc_method}", self.base_url)
    }

    fn decorate(&self, rb: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        rb: reqwest::RequestBuilder,
    ) -> Result<T> {
        let resp = self
            .decorate(rb)
            .send()
            .await
            .map_err(|e| Error::RepoFetchFailed(e.to_string()))?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Authentication(format!(
                "hosting server rejected credentials (HTTP {status})"
            )));
        }
        if !status.is_success() {
            return Err(Error::RepoFetchFailed(format!("HTTP {status}")));
        }
        resp.json()
            .await
            .map_err(|e| Error::RepoParseFailed(format!("decoding response body: {e}")))
    }

    /// `com.atproto.server.createSession`: exchanges a handle/app-password
    /// pair for a session. Unauthenticated by definition, so this never
    /// sends the bearer header even if one was set on construction.
    pub async fn create_session(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<CreateSessionResponse> {
        let body = CreateSessionRequest { identifier, password };
        let resp = self
            .http
            .post(self.url("com.atproto.server.createSession"))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::RepoFetchFailed(e.to_string()))?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Authentication(format!(
                "hosting server rejected credentials (HTTP {status})"
            )));
        }
        if !status.is_success() {
            return Err(Error::RepoFetchFailed(format!("HTTP {status}")));
        }
        resp.json()
            .await
            .map_err(|e| Error::RepoParseFailed(format!("decoding response body: {e}")))
    }

    pub async fn get_record(
        &self,
        repo: &str,
        collection: &str,
        rkey: &str,
    ) -> Result<GetRecordResponse> {
        let rb = self.http.get(self.url("com.atproto.repo.getRecord")).query(&[
            ("repo", repo),
            ("collection", collection),
            ("rkey", rkey),
        ]);
        self.send_json(rb).await
    }

    pub async fn create_record(
        &self,
        repo: &str,
        collection: &str,
        record: serde_json::Value,
    ) -> Result<CreateRecordResponse> {
        let body = CreateRecordRequest {
            repo,
            collection,
            record,
        };
        let rb = self
            .http
            .post(self.url("com.atproto.repo.createRecord"))
            .json(&body);
        self.send_json(rb).await
    }

    pub async fn delete_record(&self, repo: &str, collection: &str, rkey: &str) -> Result<()> {
        let body = DeleteRecordRequest {
            repo,
            collection,
            rkey,
        };
        let resp = self
            .decorate(
                self.http
                    .post(self.url("com.atproto.repo.deleteRecord"))
                    .json(&body),
            )
            .send()
            .await
            .map_err(|e| Error::RepoFetchFailed(e.to_string()))?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Authentication(format!(
                "hosting server rejected credentials (HTTP {status})"
            )));
        }
        if !status.is_success() {
            return Err(Error::RepoFetchFailed(format!("HTTP {status}")));
        }
        Ok(())
    }

    pub async fn get_post_thread(&self, uri: &str) -> Result<ThreadViewNode> {
        let rb = self
            .http
            .get(self.url("app.bsky.feed.getPostThread"))
            .query(&[("uri", uri)]);
        let resp: GetPostThreadResponse = self.send_json(rb).await?;
        Ok(resp.thread)
    }

    /// `app.bsky.feed.getTimeline`: the authenticated account's own
    /// aggregated follows timeline, used when a tool call omits an
    /// explicit feed generator URI.
    pub async fn get_timeline(
        &self,
        cursor: Option<&str>,
        limit: Option<u32>,
    ) -> Result<GetFeedResponse> {
        let mut query = Vec::new();
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        let rb = self
            .http
            .get(self.url("app.bsky.feed.getTimeline"))
            .query(&query);
        self.send_json(rb).await
    }

    pub async fn get_feed(
        &self,
        feed: &str,
        cursor: Option<&str>,
        limit: Option<u32>,
    ) -> Result<GetFeedResponse> {
        let mut query = vec![("feed", feed.to_string())];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        let rb = self
            .http
            .get(self.url("app.bsky.feed.getFeed"))
            .query(&query);
        self.send_json(rb).await
    }
}
