use pryx_domain::config::{Config, ConfigSeverity};

/// Parse the config and print every validation issue. Returns `true` when
/// there are no `Error`-severity issues.
pub fn validate(config: &Config, config_path: &std::path::Path) -> bool {
    println!("Validating {}", config_path.display());

    let issues = config.validate();
    if issues.is_empty() {
        println!("OK — no issues found.");
        return true;
    }

    for issue in &issues {
        println!("  {issue}");
    }

    let error_count = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    println!(
        "\n{} error(s), {} warning(s).",
        error_count,
        issues.len() - error_count
    );

    error_count == 0
}

/// Dump the resolved config (with all defaults filled in) as YAML.
pub fn show(config: &Config) {
    match serde_yaml::to_string(config) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("Failed to serialize config: {e}");
            std::process::exit(1);
        }
    }
}
