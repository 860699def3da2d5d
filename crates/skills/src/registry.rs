//! Three-layer skill discovery (bundled < managed < workspace) with a
//! bounded concurrent worker pool, last-writer-wins precedence, and
//! aggregate parse-error accumulation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pryx_domain::{Error, Result};
use tokio::sync::Semaphore;

use crate::loader;
use crate::manifest::parse_frontmatter;
use crate::types::{DiscoveryError, Layer, Skill};

pub struct SkillsRegistry {
    skills: HashMap<String, Skill>,
}

impl SkillsRegistry {
    pub fn empty() -> Self {
        Self {
            skills: HashMap::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Skill> {
        self.skills.get(id)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// All skills, sorted by id.
    pub fn list(&self) -> Vec<&Skill> {
        let mut entries: Vec<&Skill> = self.skills.values().collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }

    /// Deterministic one-line-per-skill summary, sorted by id.
    pub fn summary(&self) -> String {
        self.list()
            .iter()
            .map(|s| s.summary_line())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn read_doc(&self, id: &str) -> Result<String> {
        let skill = self
            .skills
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("skill {id}")))?;
        skill.body().map_err(Error::from)
    }
}

/// Discover skills across the three roots and fold them into a single
/// registry, applying bundled < managed < workspace precedence. Parse
/// errors never abort discovery; they come back alongside the registry.
pub async fn discover(
    bundled: &Path,
    managed: &Path,
    workspace: &Path,
    worker_count: usize,
) -> (SkillsRegistry, Vec<DiscoveryError>) {
    let mut skills = HashMap::new();
    let mut errors = Vec::new();

    for (layer, root) in [
        (Layer::Bundled, bundled),
        (Layer::Managed, managed),
        (Layer::Workspace, workspace),
    ] {
        let (found, mut layer_errors) = discover_layer(root, layer, worker_count).await;
        errors.append(&mut layer_errors);
        // Later layers overwrite earlier ones; within a layer, iteration
        // order is filesystem-defined and last-writer-wins, matching the
        // insert-over-existing-key behavior here.
        for skill in found {
            skills.insert(skill.id.clone(), skill);
        }
    }

    (SkillsRegistry { skills }, errors)
}

async fn discover_layer(
    root: &Path,
    layer: Layer,
    worker_count: usize,
) -> (Vec<Skill>, Vec<DiscoveryError>) {
    let files = match loader::find_skill_files(root) {
        Ok(f) => f,
        Err(e) => {
            return (
                Vec::new(),
                vec![DiscoveryError {
                    path: root.to_path_buf(),
                    message: e.to_string(),
                }],
            )
        }
    };

    let semaphore = Arc::new(Semaphore::new(worker_count.max(1)));
    let mut set = tokio::task::JoinSet::new();
    for file in files {
        let semaphore = semaphore.clone();
        set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore not closed");
            load_one(file, layer)
        });
    }

    let mut skills = Vec::new();
    let mut errors = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Ok(skill)) => skills.push(skill),
            Ok(Err(err)) => errors.push(err),
            Err(join_err) => errors.push(DiscoveryError {
                path: PathBuf::new(),
                message: format!("discovery task panicked: {join_err}"),
            }),
        }
    }
    (skills, errors)
}

fn load_one(skill_md_path: PathBuf, layer: Layer) -> std::result::Result<Skill, DiscoveryError> {
    let err = |message: String| DiscoveryError {
        path: skill_md_path.clone(),
        message,
    };

    let content = std::fs::read_to_string(&skill_md_path).map_err(|e| err(e.to_string()))?;
    let (frontmatter, _body) = parse_frontmatter(&content).map_err(err)?;
    let dir = skill_md_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| skill_md_path.clone());

    Ok(Skill {
        id: frontmatter.name.expect("parse_frontmatter guarantees name"),
        layer,
        path: dir,
        description: frontmatter.description,
        metadata: frontmatter.metadata.and_then(|m| m.pryx),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_skill(root: &Path, dir: &str, name: &str, description: &str) {
        let skill_dir = root.join(dir);
        std::fs::create_dir_all(&skill_dir).unwrap();
        std::fs::write(
            skill_dir.join("SKILL.md"),
            format!("---\nname: {name}\ndescription: {description}\n---\nbody"),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn workspace_layer_overrides_bundled_for_same_id() {
        let bundled = tempfile::tempdir().unwrap();
        let managed = tempfile::tempdir().unwrap();
        let workspace = tempfile::tempdir().unwrap();

        write_skill(bundled.path(), "git", "git-helper", "bundled version");
        write_skill(workspace.path(), "git", "git-helper", "workspace version");

        let (registry, errors) =
            discover(bundled.path(), managed.path(), workspace.path(), 4).await;
        assert!(errors.is_empty());
        let skill = registry.get("git-helper").unwrap();
        assert_eq!(skill.description.as_deref(), Some("workspace version"));
        assert_eq!(skill.layer, Layer::Workspace);
    }

    #[tokio::test]
    async fn distinct_ids_across_layers_all_survive() {
        let bundled = tempfile::tempdir().unwrap();
        let managed = tempfile::tempdir().unwrap();
        let workspace = tempfile::tempdir().unwrap();

        write_skill(bundled.path(), "a", "alpha", "a");
        write_skill(managed.path(), "b", "beta", "b");
        write_skill(workspace.path(), "c", "gamma", "c");

        let (registry, errors) =
            discover(bundled.path(), managed.path(), workspace.path(), 4).await;
        assert!(errors.is_empty());
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn invalid_skill_does_not_abort_discovery() {
        let bundled = tempfile::tempdir().unwrap();
        let managed = tempfile::tempdir().unwrap();
        let workspace = tempfile::tempdir().unwrap();

        write_skill(bundled.path(), "good", "good-skill", "fine");
        let bad_dir = bundled.path().join("bad");
        std::fs::create_dir_all(&bad_dir).unwrap();
        std::fs::write(bad_dir.join("SKILL.md"), "no frontmatter here").unwrap();

        let (registry, errors) =
            discover(bundled.path(), managed.path(), workspace.path(), 4).await;
        assert_eq!(registry.len(), 1);
        assert_eq!(errors.len(), 1);
    }

    #[tokio::test]
    async fn summary_is_sorted_by_id() {
        let bundled = tempfile::tempdir().unwrap();
        let managed = tempfile::tempdir().unwrap();
        let workspace = tempfile::tempdir().unwrap();

        write_skill(bundled.path(), "z", "zeta", "last alphabetically");
        write_skill(bundled.path(), "a", "alpha", "first alphabetically");

        let (registry, _) = discover(bundled.path(), managed.path(), workspace.path(), 4).await;
        let summary = registry.summary();
        let alpha_pos = summary.find("alpha").unwrap();
        let zeta_pos = summary.find("zeta").unwrap();
        assert!(alpha_pos < zeta_pos);
    }

    #[tokio::test]
    async fn missing_roots_yield_empty_registry() {
        let (registry, errors) = discover(
            Path::new("/no/such/bundled"),
            Path::new("/no/such/managed"),
            Path::new("/no/such/workspace"),
            4,
        )
        .await;
        assert!(registry.is_empty());
        assert!(errors.is_empty());
    }
}
