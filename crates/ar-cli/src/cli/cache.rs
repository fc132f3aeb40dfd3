use ar_domain::Config;

pub async fn clean(config: &Config) -> anyhow::Result<()> {
    let root = config
        .cache
        .root_override
        .clone()
        .map(std::path::PathBuf::from)
        .unwrap_or_else(ar_cache::default_cache_root);
    let manager = ar_cache::CacheManager::new(root);
    let removed = manager.cleanup_expired().await?;
    println!("Removed {removed} expired cache entr{}", if removed == 1 { "y" } else { "ies" });
    Ok(())
}
