use std::path::{Path, PathBuf};

/// Recursively find every `SKILL.md` (case-insensitive) under `root`.
/// Missing roots are not an error — they simply contribute no files.
pub fn find_skill_files(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    if !root.exists() {
        return Ok(found);
    }
    walk(root, &mut found)?;
    Ok(found)
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            walk(&path, found)?;
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.eq_ignore_ascii_case("skill.md") {
                found.push(path);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_skill_md_case_insensitively_and_nested() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("a")).unwrap();
        std::fs::create_dir_all(tmp.path().join("b/nested")).unwrap();
        std::fs::write(tmp.path().join("a/SKILL.md"), "---\nname: a\n---\n").unwrap();
        std::fs::write(tmp.path().join("b/nested/skill.md"), "---\nname: b\n---\n").unwrap();

        let found = find_skill_files(tmp.path()).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn missing_root_yields_no_files() {
        let found = find_skill_files(Path::new("/definitely/does/not/exist/anywhere")).unwrap();
        assert!(found.is_empty());
    }
}
