//! Resolves the account and bearer token backing a write or view call:
//! either an inline `login`/`password` pair (a lightweight session,
//! persisted as the new default the way `ar-cli login` does) or the
//! stored default credential (§4.3).

use ar_client::PdsClient;
use ar_credentials::CredentialStore;
use ar_domain::{Credentials, Error, Handle, Result, Sid};
use ar_identity::IdentityResolver;

pub struct Session {
    pub sid: Sid,
    pub hosting_url: String,
    pub access_token: String,
}

/// Establish a session for a call that may carry inline credentials. When
/// neither `login` nor `password` is given, falls back to the stored
/// default handle; an unauthenticated call (both tools accept it — e.g.
/// a public feed) is signaled by returning `Ok(None)` only from
/// [`resolve_optional`], not from here.
pub async fn establish(
    resolver: &IdentityResolver,
    credentials: &CredentialStore,
    user_agent: &str,
    login: Option<&str>,
    password: Option<&str>,
) -> Result<Session> {
    match (login, password) {
        (Some(login), Some(password)) => {
            let sid = resolver.resolve(login).await?;
            let hosting_url = resolver.resolve_hosting_url(&sid).await?;
            let client = PdsClient::new(&hosting_url, None, user_agent)?;
            let session = client.create_session(login, password).await?;

            if let Ok(handle) = Handle::parse(login) {
                match resolver.verify_handle(&sid, &handle).await {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::warn!(%login, %sid, "handle does not appear in the account's alsoKnownAs list");
                    }
                    Err(e) => tracing::warn!(%login, error = %e, "bidirectional handle verification failed"),
                }
            }

            let creds = Credentials {
                handle: login.to_string(),
                sid: session.did.clone(),
                access_token: session.access_jwt.clone(),
                refresh_token: session.refresh_jwt,
                expires_at: now_unix() + 2 * 60 * 60,
                scope: "atproto".to_string(),
                dpop_key_pem: None,
            };
            credentials.save(login, &creds)?;
            credentials.set_default(login)?;

            Ok(Session {
                sid,
                hosting_url,
                access_token: session.access_jwt,
            })
        }
        (None, None) => {
            let handle = credentials.get_default()?;
            let creds = credentials.load(&handle)?;
            if creds.is_expired(now_unix()) {
                return Err(Error::Authentication(format!(
                    "stored session for {handle} has expired; log in again"
                )));
            }
            let sid = Sid::parse(&creds.sid)?;
            let hosting_url = resolver.resolve_hosting_url(&sid).await?;
            Ok(Session {
                sid,
                hosting_url,
                access_token: creds.access_token,
            })
        }
        _ => Err(Error::InvalidInput(
            "login and password must both be provided, or both omitted".to_string(),
        )),
    }
}

/// Like [`establish`], but returns `Ok(None)` instead of erroring when no
/// inline credentials were given and no default handle is stored — used
/// by tools that have a usable unauthenticated path (`feed`, `thread`).
pub async fn establish_optional(
    resolver: &IdentityResolver,
    credentials: &CredentialStore,
    user_agent: &str,
    login: Option<&str>,
    password: Option<&str>,
) -> Result<Option<Session>> {
    if login.is_none() && password.is_none() && credentials.get_default().is_err() {
        return Ok(None);
    }
    establish(resolver, credentials, user_agent, login, password).await.map(Some)
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}
