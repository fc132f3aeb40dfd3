//! `autoreply-cli login/logout/whoami` — app-password session
//! management backed by the same credential store the tool functions
//! use (§4.3).

use ar_domain::Config;
use ar_tools::{LoginArgs, Tools};

pub async fn login(config: &Config, login: &str, password: Option<String>) -> anyhow::Result<()> {
    let password = match password {
        Some(p) => p,
        None => rpassword::prompt_password_stderr(&format!("App password for {login}: "))?,
    };

    let tools = Tools::new(config)?;
    let result = tools
        .login(LoginArgs {
            login: login.to_string(),
            password,
        })
        .await?;

    println!("Logged in as {} ({})", result.handle, result.sid);
    Ok(())
}

pub fn logout(config: &Config, handle: Option<String>) -> anyhow::Result<()> {
    let store = ar_credentials::CredentialStore::new(config);
    let handle = match handle {
        Some(h) => h,
        None => store.get_default()?,
    };
    store.delete(&handle)?;
    println!("Removed stored session for {handle}");
    Ok(())
}

pub fn whoami(config: &Config) -> anyhow::Result<()> {
    let store = ar_credentials::CredentialStore::new(config);
    let handle = store.get_default()?;
    let creds = store.load(&handle)?;
    let expired = creds.is_expired(chrono::Utc::now().timestamp());

    println!("Handle: {}", creds.handle);
    println!("SID:    {}", creds.sid);
    println!("Scope:  {}", creds.scope);
    println!("Status: {}", if expired { "expired" } else { "active" });
    Ok(())
}
