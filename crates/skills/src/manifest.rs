//! YAML frontmatter parsing for `SKILL.md` files.
//!
//! ```yaml
//! ---
//! name: git-helper
//! description: Git workflow automation
//! metadata:
//!   pryx:
//!     emoji: "🔧"
//!     requires:
//!       bins: [git]
//!       env: [GITHUB_TOKEN]
//!     install:
//!       - kind: brew
//!         command: "brew install git"
//!         provides: git
//! ---
//! ```
//!
//! `name` is required; everything else is optional.

use serde::{Deserialize, Serialize};

/// Validates a skill name: `^[a-z0-9]+(-[a-z0-9]+)*$`
pub fn is_valid_skill_name(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let mut expect_alnum = true;
    for ch in name.chars() {
        if expect_alnum {
            if !ch.is_ascii_lowercase() && !ch.is_ascii_digit() {
                return false;
            }
            expect_alnum = false;
        } else if ch == '-' {
            expect_alnum = true;
        } else if !ch.is_ascii_lowercase() && !ch.is_ascii_digit() {
            return false;
        }
    }
    !expect_alnum || name.len() == 1
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SkillFrontmatter {
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Option<FrontmatterMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FrontmatterMetadata {
    #[serde(default)]
    pub pryx: Option<PryxMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PryxMetadata {
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub requires: SkillRequirements,
    #[serde(default)]
    pub install: Vec<InstallStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SkillRequirements {
    #[serde(default)]
    pub bins: Vec<String>,
    #[serde(default)]
    pub env: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallStep {
    #[serde(alias = "method")]
    pub kind: String,
    pub command: String,
    #[serde(default)]
    pub provides: Option<String>,
}

/// Parse YAML frontmatter from a `SKILL.md` file. Returns `(frontmatter,
/// body)` where body is everything after the closing `---`. `Err` carries a
/// human-readable message meant to be accumulated by the caller, not
/// propagated as a fatal error.
pub fn parse_frontmatter(content: &str) -> Result<(SkillFrontmatter, String), String> {
    let trimmed = content.trim_start();
    if !trimmed.starts_with("---") {
        return Err("missing YAML frontmatter (no leading ---)".to_string());
    }

    let after_open = &trimmed[3..];
    let close_idx = after_open
        .find("\n---")
        .ok_or_else(|| "missing closing --- delimiter".to_string())?;
    let yaml_str = &after_open[..close_idx];
    let body_start = close_idx + 4;
    let body = after_open[body_start..].trim_start_matches('\n').to_string();

    let frontmatter: SkillFrontmatter =
        serde_yaml::from_str(yaml_str).map_err(|e| format!("invalid frontmatter YAML: {e}"))?;

    match &frontmatter.name {
        None => return Err("missing required field: name".to_string()),
        Some(n) if !is_valid_skill_name(n) => {
            return Err(format!(
                "invalid skill name '{n}': must match ^[a-z0-9]+(-[a-z0-9]+)*$"
            ));
        }
        _ => {}
    }

    Ok((frontmatter, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_skill_names() {
        assert!(is_valid_skill_name("git-helper"));
        assert!(is_valid_skill_name("a"));
        assert!(is_valid_skill_name("a1b2"));
    }

    #[test]
    fn invalid_skill_names() {
        assert!(!is_valid_skill_name(""));
        assert!(!is_valid_skill_name("Git-Helper"));
        assert!(!is_valid_skill_name("my_skill"));
        assert!(!is_valid_skill_name("my--skill"));
        assert!(!is_valid_skill_name("-leading"));
        assert!(!is_valid_skill_name("trailing-"));
    }

    #[test]
    fn parse_full_frontmatter() {
        let md = r#"---
name: git-helper
description: Git workflow automation
metadata:
  pryx:
    emoji: "🔧"
    requires:
      bins: [git]
      env: [GITHUB_TOKEN]
    install:
      - kind: brew
        command: "brew install git"
        provides: git
---
# Git Helper
Full docs here.
"#;
        let (fm, body) = parse_frontmatter(md).unwrap();
        assert_eq!(fm.name.as_deref(), Some("git-helper"));
        assert_eq!(fm.description.as_deref(), Some("Git workflow automation"));
        let pryx = fm.metadata.unwrap().pryx.unwrap();
        assert_eq!(pryx.emoji.as_deref(), Some("🔧"));
        assert_eq!(pryx.requires.bins, vec!["git"]);
        assert_eq!(pryx.install.len(), 1);
        assert!(body.starts_with("# Git Helper"));
    }

    #[test]
    fn parse_minimal_frontmatter() {
        let md = "---\nname: minimal\n---\nbody text";
        let (fm, body) = parse_frontmatter(md).unwrap();
        assert_eq!(fm.name.as_deref(), Some("minimal"));
        assert!(fm.description.is_none());
        assert_eq!(body, "body text\n");
    }

    #[test]
    fn missing_name_is_an_error() {
        let md = "---\ndescription: no name here\n---\nbody";
        assert!(parse_frontmatter(md).is_err());
    }

    #[test]
    fn missing_frontmatter_is_an_error() {
        let md = "# Just a skill\nNo frontmatter here.";
        assert!(parse_frontmatter(md).is_err());
    }

    #[test]
    fn install_step_accepts_method_alias() {
        let md = r#"---
name: old-style
metadata:
  pryx:
    install:
      - method: npm
        command: "npm install -g foo"
---
"#;
        let (fm, _) = parse_frontmatter(md).unwrap();
        let pryx = fm.metadata.unwrap().pryx.unwrap();
        assert_eq!(pryx.install[0].kind, "npm");
    }
}
