//! Mapping wire file names onto the local filesystem.

use anyhow::{anyhow, bail, Result};
use std::path::{Component, Path, PathBuf};

/// Resolve a name received on the wire. Without confinement the name is
/// joined to `root` as-is, so `..` and absolute paths reach outside it.
pub fn resolve(root: &Path, name: &str, confine: bool) -> Result<PathBuf> {
    if confine {
        normalize_under_root(root, Path::new(name))
    } else {
        Ok(root.join(name))
    }
}

/// Normalize a path to be safely under a root directory:
/// rejects NUL bytes, absolute paths and parent components, then
/// canonicalizes (resolving symlinks) and checks the result stays in `root`.
pub fn normalize_under_root(root: &Path, p: &Path) -> Result<PathBuf> {
    use Component::{CurDir, Normal, ParentDir, Prefix, RootDir};

    if p.to_string_lossy().contains('\0') {
        bail!("path contains NUL byte");
    }

    let mut safe = PathBuf::new();
    for component in p.components() {
        match component {
            CurDir => {}
            Normal(s) => safe.push(s),
            ParentDir | RootDir | Prefix(_) => {
                bail!("path contains disallowed component: {:?}", component);
            }
        }
    }
    if safe.as_os_str().is_empty() {
        bail!("empty file name");
    }

    let root = root
        .canonicalize()
        .map_err(|e| anyhow!("failed to canonicalize root {:?}: {}", root, e))?;
    let joined = root.join(&safe);

    // Existing paths resolve symlinks; new files resolve through their parent
    let final_path = if joined.exists() {
        joined
            .canonicalize()
            .map_err(|e| anyhow!("failed to canonicalize {:?}: {}", joined, e))?
    } else {
        match (joined.parent(), joined.file_name()) {
            (Some(parent), Some(filename)) if parent.exists() => parent
                .canonicalize()
                .map_err(|e| anyhow!("failed to canonicalize parent {:?}: {}", parent, e))?
                .join(filename),
            _ => joined,
        }
    };

    if !final_path.starts_with(&root) {
        bail!("path {:?} escapes root {:?}", p, root);
    }
    Ok(final_path)
}
