use std::fs;
use std::path::Path;

use fstree_common::{Error, Result};

/// Rename the filesystem object at `dst_root`/`relative` aside to the first
/// available `.bak[N]` sibling, clamping the component name if needed (see
/// `fstree_pathutil::clamp_component_name`). Returns the chosen sibling's
/// relative path, e.g. `"foo/bar.txt.bak2"`.
pub fn rename_aside(dst_root: &Path, relative: &str) -> Result<String> {
    let full = fstree_pathutil::join(dst_root, relative);
    let base_name = fstree_pathutil::file_name(relative);
    let parent_relative = fstree_pathutil::parent(relative);
    let parent_absolute = match parent_relative {
        Some(p) => fstree_pathutil::join(dst_root, p),
        None => dst_root.to_path_buf(),
    };

    let sibling_name = first_available_sibling(&parent_absolute, base_name);
    let sibling_full = parent_absolute.join(&sibling_name);

    fs::rename(&full, &sibling_full).map_err(|source| Error::IoDest {
        path: full.clone(),
        source,
    })?;

    log::debug!("renamed aside: {relative} -> {sibling_name}");

    Ok(match parent_relative {
        Some(p) => format!("{p}/{sibling_name}"),
        None => sibling_name,
    })
}

fn first_available_sibling(parent: &Path, base_name: &str) -> String {
    let mut n = 1u32;
    loop {
        let suffix = if n == 1 {
            ".bak".to_string()
        } else {
            format!(".bak{n}")
        };
        let candidate = fstree_pathutil::clamp_component_name(base_name, &suffix);
        if !parent.join(&candidate).exists() {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn first_rename_uses_bak_suffix() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        let alt = rename_aside(dir.path(), "a.txt").unwrap();
        assert_eq!(alt, "a.txt.bak");
        assert!(dir.path().join("a.txt.bak").exists());
        assert!(!dir.path().join("a.txt").exists());
    }

    #[test]
    fn second_rename_uses_bak2_suffix() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        std::fs::write(dir.path().join("a.txt.bak"), "placeholder").unwrap();
        let alt = rename_aside(dir.path(), "a.txt").unwrap();
        assert_eq!(alt, "a.txt.bak2");
    }

    #[test]
    fn rename_aside_preserves_nested_parent() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("foo")).unwrap();
        std::fs::write(dir.path().join("foo/a.txt"), "x").unwrap();
        let alt = rename_aside(dir.path(), "foo/a.txt").unwrap();
        assert_eq!(alt, "foo/a.txt.bak");
    }

    #[test]
    fn rename_aside_of_directory_keeps_it_a_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("foo/sub")).unwrap();
        let alt = rename_aside(dir.path(), "foo").unwrap();
        assert_eq!(alt, "foo.bak");
        assert!(dir.path().join("foo.bak/sub").is_dir());
    }
}
