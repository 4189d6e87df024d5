use dirsnap_scan::{Node, ScanError, ScanOptions, ScanResult, WalkScanner};
use proptest::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn scan(options: &ScanOptions) -> Result<ScanResult, ScanError> {
    WalkScanner::new().scan(options, &CancellationToken::new(), |_| {})
}

fn child<'a>(node: &'a Node, name: &str) -> &'a Node {
    node.children
        .iter()
        .find(|c| c.name == name)
        .unwrap_or_else(|| panic!("missing child {name}"))
}

#[test]
fn test_sizes_and_counts() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("a.txt"), vec![0u8; 100]).unwrap();
    fs::write(root.join("b.txt"), vec![0u8; 200]).unwrap();
    fs::create_dir(root.join("sub")).unwrap();
    fs::write(root.join("sub/c.txt"), vec![0u8; 50]).unwrap();

    let result = scan(&ScanOptions::new(root)).unwrap();

    assert_eq!(result.total_files, 3);
    assert_eq!(result.total_folders, 1);
    assert_eq!(result.root.size, 350);
    assert_eq!(child(&result.root, "sub").size, 50);
    assert_eq!(child(&result.root, "a.txt").size, 100);
    assert!(child(&result.root, "sub").is_dir());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_empty_root() {
    let temp = TempDir::new().unwrap();
    let result = scan(&ScanOptions::new(temp.path())).unwrap();

    assert_eq!(result.total_files, 0);
    assert_eq!(result.total_folders, 0);
    assert_eq!(result.root.size, 0);
    assert!(result.root.children.is_empty());
}

#[test]
fn test_root_path_is_absolute() {
    let temp = TempDir::new().unwrap();
    let result = scan(&ScanOptions::new(temp.path())).unwrap();

    assert!(Path::new(&result.root_path).is_absolute());
    assert_eq!(result.root.path, result.root_path);
}

#[test]
fn test_hidden_entries() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("visible.txt"), "v").unwrap();
    fs::write(root.join(".hidden"), "hh").unwrap();
    fs::create_dir(root.join(".git")).unwrap();
    fs::write(root.join(".git/HEAD"), "ref").unwrap();

    let result = scan(&ScanOptions::new(root)).unwrap();
    assert_eq!(result.total_files, 1);
    assert_eq!(result.total_folders, 0);
    assert_eq!(result.root.size, 1);

    let options = ScanOptions::builder()
        .root(root)
        .include_hidden(true)
        .build()
        .unwrap();
    let result = scan(&options).unwrap();
    assert_eq!(result.total_files, 3);
    assert_eq!(result.total_folders, 1);
    assert_eq!(result.root.size, 1 + 2 + 3);
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_leaves() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir(root.join("target")).unwrap();
    fs::write(root.join("target/big.bin"), vec![0u8; 4096]).unwrap();
    std::os::unix::fs::symlink(root.join("target"), root.join("link")).unwrap();
    std::os::unix::fs::symlink(root, root.join("target/loop")).unwrap();

    let result = scan(&ScanOptions::new(root)).unwrap();

    let link = child(&result.root, "link");
    assert!(link.is_symlink());
    assert!(link.children.is_empty());

    // big.bin counted once, loop not followed.
    assert_eq!(result.total_folders, 1);
    assert_eq!(result.total_files, 3);
    assert_eq!(result.root.files().len(), 3);
}

#[test]
fn test_missing_root() {
    let temp = TempDir::new().unwrap();
    let err = scan(&ScanOptions::new(temp.path().join("absent"))).unwrap_err();
    assert!(matches!(err, ScanError::RootNotFound { .. }));
}

#[test]
fn test_file_root() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("only.txt");
    fs::write(&file, "x").unwrap();

    let err = scan(&ScanOptions::new(&file)).unwrap_err();
    assert!(matches!(err, ScanError::RootNotDirectory { .. }));
}

#[test]
fn test_cancellation() {
    let temp = TempDir::new().unwrap();
    for i in 0..20 {
        fs::write(temp.path().join(format!("f{i}")), "x").unwrap();
    }

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = WalkScanner::new()
        .scan(&ScanOptions::new(temp.path()), &cancel, |_| {})
        .unwrap_err();
    assert!(matches!(err, ScanError::Cancelled));
}

#[test]
fn test_cancel_mid_walk() {
    let temp = TempDir::new().unwrap();
    for d in 0..5 {
        let dir = temp.path().join(format!("d{d}"));
        fs::create_dir(&dir).unwrap();
        for f in 0..20 {
            fs::write(dir.join(format!("f{f}")), "x").unwrap();
        }
    }

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let mut last_seen = 0;
    let err = WalkScanner::new()
        .with_progress_interval(Duration::ZERO)
        .scan(&ScanOptions::new(temp.path()), &cancel, |p| {
            last_seen = p.total_items();
            if p.total_items() >= 10 {
                trigger.cancel();
            }
        })
        .unwrap_err();

    assert!(matches!(err, ScanError::Cancelled));
    // The walk stops at the next entry, with no final update.
    assert_eq!(last_seen, 10);
}

#[test]
fn test_vanished_folder_is_recorded_and_walk_continues() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    for name in ["left", "right"] {
        fs::create_dir(root.join(name)).unwrap();
        fs::write(root.join(name).join("inner.txt"), "12345").unwrap();
    }
    fs::write(root.join("top.txt"), "abc").unwrap();

    // Remove whichever folder the walk has not reached yet.
    let mut removed: Option<&str> = None;
    let result = WalkScanner::new()
        .with_progress_interval(Duration::ZERO)
        .scan(&ScanOptions::new(root), &CancellationToken::new(), |p| {
            if removed.is_some() {
                return;
            }
            let other = if p.current_path.ends_with("left") {
                "right"
            } else if p.current_path.ends_with("right") {
                "left"
            } else {
                return;
            };
            fs::remove_dir_all(root.join(other)).unwrap();
            removed = Some(other);
        })
        .unwrap();

    let gone = removed.expect("a folder was visited");
    let kept = if gone == "left" { "right" } else { "left" };

    assert_eq!(result.warnings.len(), 1, "{:?}", result.warnings);
    let warning = &result.warnings[0];
    assert!(warning.starts_with("Cannot access "), "{warning}");
    let gone_path: PathBuf = Path::new(&result.root_path).join(gone);
    assert!(warning.contains(&*gone_path.to_string_lossy()), "{warning}");

    // Recorded as an empty folder; everything else is scanned.
    assert!(child(&result.root, gone).children.is_empty());
    assert_eq!(child(&result.root, kept).children.len(), 1);
    assert_eq!(result.total_folders, 2);
    assert_eq!(result.total_files, 2);
    assert_eq!(result.root.size, 5 + 3);
}

#[cfg(unix)]
#[test]
fn test_unreadable_folder_is_recorded() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let locked = temp.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("secret.txt"), "x").unwrap();
    fs::write(temp.path().join("open.txt"), "yy").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can still read it; nothing to check then.
    let readable = fs::read_dir(&locked).is_ok();
    let result = (!readable).then(|| scan(&ScanOptions::new(temp.path())).unwrap());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let Some(result) = result else {
        return;
    };
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("locked"));
    assert!(child(&result.root, "locked").children.is_empty());
    assert_eq!(result.total_files, 1);
    assert_eq!(result.root.size, 2);
}

#[test]
fn test_progress_reported() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("one"), "1").unwrap();

    let mut count = 0;
    WalkScanner::new()
        .scan(&ScanOptions::new(temp.path()), &CancellationToken::new(), |_| {
            count += 1
        })
        .unwrap();
    assert!(count >= 2);
}

#[test]
fn test_children_in_discovery_order_are_stable() {
    let temp = TempDir::new().unwrap();
    for name in ["x", "y", "z"] {
        fs::write(temp.path().join(name), name).unwrap();
    }

    let first = scan(&ScanOptions::new(temp.path())).unwrap();
    let second = scan(&ScanOptions::new(temp.path())).unwrap();

    let names = |r: &ScanResult| -> Vec<String> {
        r.root.children.iter().map(|c| c.name.to_string()).collect()
    };
    assert_eq!(names(&first), names(&second));
}

/// Every directory's size equals the sum of its direct children.
fn assert_sizes_consistent(root: &Node) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_dir() {
            let sum: u64 = node.children.iter().map(|c| c.size).sum();
            assert_eq!(node.size, sum, "size mismatch at {}", node.path);
        }
        stack.extend(node.children.iter());
    }
}

/// (directory index, file size). Directory `i` is nested under `i / 2`.
fn tree_strategy() -> impl Strategy<Value = (usize, Vec<(usize, u64)>)> {
    (1usize..8).prop_flat_map(|dirs| {
        (
            Just(dirs),
            prop::collection::vec((0..dirs, 0u64..2048), 0..24),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn random_trees_aggregate((dirs, files) in tree_strategy()) {
        let temp = TempDir::new().unwrap();
        let mut paths = vec![temp.path().to_path_buf()];
        for i in 1..dirs {
            let path = paths[i / 2].join(format!("d{i}"));
            fs::create_dir(&path).unwrap();
            paths.push(path);
        }

        let mut expected = 0u64;
        for (n, (dir, size)) in files.iter().enumerate() {
            fs::write(paths[*dir].join(format!("f{n}")), vec![1u8; *size as usize]).unwrap();
            expected += size;
        }

        let result = scan(&ScanOptions::new(temp.path())).unwrap();

        prop_assert_eq!(result.root.size, expected);
        prop_assert_eq!(result.total_files, files.len() as u64);
        prop_assert_eq!(result.total_folders, (dirs - 1) as u64);
        prop_assert_eq!(result.root.descendant_count(), result.total_files + result.total_folders);
        assert_sizes_consistent(&result.root);
    }
}
