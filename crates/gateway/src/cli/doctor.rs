use pryx_domain::config::{Config, ConfigSeverity};

/// Run all diagnostic checks and print a summary.
///
/// Returns `Ok(true)` when every check passes, `Ok(false)` when at least
/// one check failed.
pub async fn run(config: &Config, config_path: &std::path::Path) -> anyhow::Result<bool> {
    println!("pryx doctor");
    println!("===========\n");

    let mut all_passed = true;

    check_config_file(config_path, &mut all_passed);
    check_config_validation(config, &mut all_passed);
    check_store_path(config, &mut all_passed);
    check_skills_roots(config);

    println!();
    if all_passed {
        println!("All checks passed.");
    } else {
        println!("Some checks failed. Review the output above.");
    }

    Ok(all_passed)
}

fn check_config_file(config_path: &std::path::Path, all_passed: &mut bool) {
    let exists = config_path.exists();
    print_check(
        "Config file exists",
        exists,
        if exists {
            config_path.display().to_string()
        } else {
            format!("{} not found (using defaults)", config_path.display())
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

fn check_store_path(config: &Config, all_passed: &mut bool) {
    let parent_exists = config
        .store
        .database_path
        .parent()
        .map(|p| p.as_os_str().is_empty() || p.exists())
        .unwrap_or(true);
    print_check(
        "Store database directory writable",
        parent_exists,
        config.store.database_path.display().to_string(),
    );
    if !parent_exists {
        *all_passed = false;
    }
}

fn check_skills_roots(config: &Config) {
    for (label, path) in [
        ("bundled", &config.skills.bundled_path),
        ("managed", &config.skills.managed_path),
        ("workspace", &config.skills.workspace_path),
    ] {
        let exists = path.exists();
        print_check(
            &format!("Skills root ({label})"),
            true,
            if exists {
                path.display().to_string()
            } else {
                format!("{} not found (no skills from this layer)", path.display())
            },
        );
    }
}

fn print_check(name: &str, passed: bool, detail: String) {
    let mark = if passed { "✓" } else { "✗" };
    println!("  [{mark}] {name}: {detail}");
}
