use std::path::{Path, PathBuf};

pub fn file_exists<P>(path: P) -> bool
where
    P: AsRef<Path>,
{
    path.as_ref().exists()
}

/// Joins `path` under `root` even when `path` is absolute,
/// e.g. ("/mnt", "/etc/default/grub") => "/mnt/etc/default/grub"
pub fn in_root<P>(root: &str, path: P) -> PathBuf
where
    P: AsRef<Path>,
{
    let root = if root.is_empty() { "/" } else { root };
    let relative = path.as_ref().strip_prefix("/").unwrap_or(path.as_ref());

    Path::new(root).join(relative)
}

#[test]
fn test_in_root() {
    let tests = [
        (("/mnt", "/etc/default/grub"), "/mnt/etc/default/grub"),
        (("/mnt", "etc/default/grub"), "/mnt/etc/default/grub"),
        (("/", "/etc/grub.d/40_custom"), "/etc/grub.d/40_custom"),
        (("", "/etc/default/grub"), "/etc/default/grub"),
    ];

    for ((root, path), expected) in tests {
        assert_eq!(Path::new(expected), in_root(root, path));
    }
}
