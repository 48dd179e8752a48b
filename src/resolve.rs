use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::package::JavaPackage;

/// Returns the source root implied by a file living in `dir` and declaring
/// `package`, or `None` when the trailing directories disagree with the
/// package.
///
/// Segments are compared from the end. Whichever side runs out first ends
/// the comparison; the directory prefix that was not consumed is the root.
pub fn resolve_source_root(dir: &Path, package: &JavaPackage) -> Option<PathBuf> {
    if package.is_default() {
        return Some(dir.to_path_buf());
    }

    let mut remaining = dir.components();
    for ident in package.identifiers().rev() {
        let mut probe = remaining.clone();
        match probe.next_back() {
            Some(Component::Normal(segment)) => {
                if segment != OsStr::new(ident) {
                    return None;
                }
                remaining = probe;
            }
            _ => break,
        }
    }

    Some(remaining.as_path().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(name: &str) -> JavaPackage {
        JavaPackage::new(name)
    }

    #[test]
    fn strips_matching_package_segments() {
        let root = resolve_source_root(Path::new("/repo/src/com/acme"), &pkg("com.acme"));
        assert_eq!(root, Some(PathBuf::from("/repo/src")));
    }

    #[test]
    fn default_package_is_own_directory() {
        let root = resolve_source_root(Path::new("/repo/src"), &JavaPackage::default());
        assert_eq!(root, Some(PathBuf::from("/repo/src")));
    }

    #[test]
    fn mismatch_is_no_match() {
        assert_eq!(
            resolve_source_root(Path::new("/repo/gen/com/other"), &pkg("com.acme")),
            None
        );
        assert_eq!(
            resolve_source_root(Path::new("/repo/src/org/acme"), &pkg("com.acme")),
            None
        );
    }

    #[test]
    fn segments_compare_whole_names() {
        // A character-wise comparison would accept `xcom/acme` for `com.acme`.
        assert_eq!(
            resolve_source_root(Path::new("/repo/src/xcom/acme"), &pkg("com.acme")),
            None
        );
        assert_eq!(
            resolve_source_root(Path::new("/repo/src/com/acme"), &pkg("m.acme")),
            None
        );
    }

    #[test]
    fn same_root_from_any_witness_in_the_chain() {
        let a = resolve_source_root(Path::new("/r/java/android/os"), &pkg("android.os"));
        let b = resolve_source_root(
            Path::new("/r/java/android/os/storage"),
            &pkg("android.os.storage"),
        );
        let c = resolve_source_root(Path::new("/r/java/android"), &pkg("android"));
        assert_eq!(a, Some(PathBuf::from("/r/java")));
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn exhausted_directory_keeps_remaining_prefix() {
        let root = resolve_source_root(Path::new("acme"), &pkg("com.acme"));
        assert_eq!(root, Some(PathBuf::new()));

        let root = resolve_source_root(Path::new("/acme"), &pkg("com.acme"));
        assert_eq!(root, Some(PathBuf::from("/")));
    }
}
