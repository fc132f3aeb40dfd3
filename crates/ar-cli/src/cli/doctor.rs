use ar_domain::{Config, ConfigSeverity};

/// Run all diagnostic checks and print a summary.
///
/// Returns `Ok(true)` when every check passes, `Ok(false)` when at least
/// one check failed.
pub async fn run(config: &Config, config_path: &str) -> anyhow::Result<bool> {
    println!("autoreply doctor");
    println!("================\n");

    let mut all_passed = true;

    check_config_file(config_path, &mut all_passed);
    check_config_validation(config, &mut all_passed);
    check_resolvers(config, &mut all_passed).await;
    check_cache_root(config, &mut all_passed);
    check_credential_backend(config, &mut all_passed);

    println!();
    if all_passed {
        println!("All checks passed.");
    } else {
        println!("Some checks failed. Review the output above.");
    }

    Ok(all_passed)
}

fn check_config_file(config_path: &str, all_passed: &mut bool) {
    let exists = std::path::Path::new(config_path).exists();
    print_check(
        "Config file exists",
        exists,
        if exists {
            config_path.to_owned()
        } else {
            format!("{config_path} not found (using defaults)")
        },
    );
    if !exists {
        *all_passed = false;
    }
}

fn check_config_validation(config: &Config, all_passed: &mut bool) {
    let issues = config.validate();
    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();

    if issues.is_empty() {
        print_check("Config validation", true, "no issues".into());
    } else {
        print_check(
            "Config validation",
            error_count == 0,
            format!("{} issue(s) ({} error(s))", issues.len(), error_count),
        );
        for issue in &issues {
            println!("      {issue}");
        }
        if error_count > 0 {
            *all_passed = false;
        }
    }
}

async fn check_resolvers(config: &Config, all_passed: &mut bool) {
    let client = match reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            print_check("Identity resolvers reachable", false, e.to_string());
            *all_passed = false;
            return;
        }
    };

    let mut reachable = 0;
    for resolver in &config.identity.resolvers {
        if client.get(resolver).send().await.is_ok() {
            reachable += 1;
        }
    }
    let ok = reachable > 0;
    print_check(
        "Identity resolvers reachable",
        ok,
        format!("{reachable}/{} reachable", config.identity.resolvers.len()),
    );
    if !ok {
        *all_passed = false;
    }
}

fn check_cache_root(config: &Config, all_passed: &mut bool) {
    let root = config
        .cache
        .root_override
        .clone()
        .map(std::path::PathBuf::from)
        .unwrap_or_else(ar_cache::default_cache_root);

    let writable = std::fs::create_dir_all(&root).is_ok() && {
        let probe = root.join(".autoreply_doctor_probe");
        let w = std::fs::write(&probe, b"probe").is_ok();
        let _ = std::fs::remove_file(&probe);
        w
    };

    print_check(
        "Cache root writable",
        writable,
        if writable {
            format!("{} (writable)", root.display())
        } else {
            format!("{} (not writable)", root.display())
        },
    );
    if !writable {
        *all_passed = false;
    }
}

fn check_credential_backend(config: &Config, all_passed: &mut bool) {
    let store = ar_credentials::CredentialStore::new(config);
    let handles = store.list_handles().unwrap_or_default();
    print_check(
        "Credential store reachable",
        true,
        format!("{} stored handle(s)", handles.len()),
    );
    let _ = all_passed;
}

fn print_check(name: &str, passed: bool, detail: String) {
    let status = if passed { "PASS" } else { "FAIL" };
    println!("  [{status}] {name}: {detail}");
}
