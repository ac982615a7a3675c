//! Entry identity and path helpers

use std::path::{Component, Path, PathBuf};

/// Strip the query string from a module id and resolve it to an absolute path
pub fn id_to_path(id: &str) -> PathBuf {
    let without_query = id.split('?').next().unwrap_or(id);
    let path = Path::new(without_query);
    if path.is_absolute() {
        normalize_path(path)
    } else {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        normalize_path(&cwd.join(path))
    }
}

/// Lexically normalize a path: drop `.` segments and fold `..` into the
/// preceding segment. The file system is not consulted.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` above the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Path rendered with forward slashes, as module ids are
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/project/app/../src/./a.css")),
            PathBuf::from("/project/src/a.css")
        );
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_path(Path::new("../a/b/..")), PathBuf::from("../a"));
    }

    #[test]
    fn test_id_to_path_strips_query() {
        assert_eq!(
            id_to_path("/project/src/index.css?inline"),
            PathBuf::from("/project/src/index.css")
        );
        assert_eq!(
            id_to_path("/project/App.vue?vue&type=style&index=0&lang.css"),
            PathBuf::from("/project/App.vue")
        );
    }

    #[test]
    fn test_id_to_path_resolves_relative() {
        let resolved = id_to_path("src/index.css");
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("src/index.css"));
    }

    #[test]
    fn test_to_slash() {
        assert_eq!(to_slash(Path::new("/a/b")), "/a/b");
    }
}
