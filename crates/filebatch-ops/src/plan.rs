//! Mapping discovered files to their planned destinations.

use std::path::{Component, Path, PathBuf};

use filebatch_core::TransferPair;

/// Build the planned transfers for a set of discovered relative paths.
///
/// With `preserve_structure` the relative path is reproduced under the
/// target root; otherwise only the file name is kept, so equally named
/// files from different subdirectories land on the same destination.
/// Output order matches input order. No I/O is performed.
pub fn plan_transfers(
    relative_paths: &[PathBuf],
    source_root: &Path,
    target_root: &Path,
    preserve_structure: bool,
) -> Vec<TransferPair> {
    relative_paths
        .iter()
        .map(|relative| {
            let source_path = source_root.join(relative);
            let destination = if preserve_structure {
                target_root.join(relative)
            } else {
                match relative.file_name() {
                    Some(name) => target_root.join(name),
                    None => target_root.join(relative),
                }
            };
            TransferPair::new(source_path, normalize_path(&destination))
        })
        .collect()
}

/// Lexically normalize a path, resolving `.` and `..` without touching disk.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            Component::Normal(part) => normalized.push(part),
        }
    }

    normalized
}
