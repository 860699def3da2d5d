use std::path::PathBuf;

use serde::Serialize;

use crate::manifest::PryxMetadata;

/// Discovery root, in increasing precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Bundled,
    Managed,
    Workspace,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Bundled => "bundled",
            Layer::Managed => "managed",
            Layer::Workspace => "workspace",
        }
    }
}

/// A loaded skill. `path` points at the skill's directory; the body is not
/// read off disk until [`Skill::body`] is called.
#[derive(Debug, Clone, Serialize)]
pub struct Skill {
    pub id: String,
    pub layer: Layer,
    pub path: PathBuf,
    pub description: Option<String>,
    #[serde(skip)]
    pub metadata: Option<PryxMetadata>,
}

impl Skill {
    /// One-line summary used by the prompt assembler, e.g.
    /// `- git-helper: Git workflow automation (workspace)`.
    pub fn summary_line(&self) -> String {
        match &self.description {
            Some(d) => format!("- {}: {} ({})", self.id, d, self.layer.as_str()),
            None => format!("- {} ({})", self.id, self.layer.as_str()),
        }
    }

    /// Lazily reads the SKILL.md body (everything after the frontmatter).
    pub fn body(&self) -> std::io::Result<String> {
        let md_path = self.path.join("SKILL.md");
        let content = std::fs::read_to_string(md_path)?;
        let (_, body) = crate::manifest::parse_frontmatter(&content)
            .unwrap_or((crate::manifest::SkillFrontmatter::default(), content));
        Ok(body)
    }
}

/// One skill whose `SKILL.md` failed to parse, paired with the reason.
/// Accumulated during discovery rather than aborting it.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryError {
    pub path: PathBuf,
    pub message: String,
}
