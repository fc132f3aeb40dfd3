//! `autoreply-cli search/profile-preview` — smoke-testing entry points
//! over the same `Tools` surface the JSON-RPC host would call.

use ar_domain::Config;
use ar_tools::{ProfileArgs, SearchArgs, Tools};

pub async fn search(config: &Config, account: &str, query: Option<String>, limit: usize) -> anyhow::Result<()> {
    let tools = Tools::new(config)?;
    let result = tools
        .search(SearchArgs {
            account: account.to_string(),
            query,
            limit: Some(limit),
        })
        .await?;

    if result.matches.is_empty() {
        println!("No matches.");
        return Ok(());
    }
    for m in &result.matches {
        println!("{}  ({})", m.uri, m.created_at);
        println!("    {}", m.text);
    }
    Ok(())
}

pub async fn profile_preview(config: &Config, account: &str) -> anyhow::Result<()> {
    let tools = Tools::new(config)?;
    let result = tools.profile(ProfileArgs { account: account.to_string() }).await?;
    print!("{}", result.markdown);
    Ok(())
}
