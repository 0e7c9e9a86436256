//! Filesystem helpers for staging build artifacts and archiving replay
//! leftovers.

use std::{
    ffi::OsStr,
    fs, io,
    path::{Path, PathBuf},
};

/// Removes a directory tree if present. Returns whether anything was there.
pub fn remove_dir_if_exists(dir: &Path) -> io::Result<bool> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Recursively copies `src` into `dst`, creating `dst` first.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Replaces `dst` with a copy of `src`.
///
/// The copy is staged next to `dst` and swapped in only once it is complete,
/// so an interrupted copy never leaves a half-written `dst` behind.
pub fn replace_dir(src: &Path, dst: &Path) -> io::Result<()> {
    let staging = staging_path(dst);
    let _cleanup = RemoveOnDrop {
        path: staging.clone(),
    };
    remove_dir_if_exists(&staging)?;
    copy_dir_recursive(src, &staging)?;
    remove_dir_if_exists(dst)?;
    fs::rename(&staging, dst)?;
    Ok(())
}

fn staging_path(dst: &Path) -> PathBuf {
    let mut name = dst
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".staging");
    dst.with_file_name(name)
}

struct RemoveOnDrop {
    path: PathBuf,
}

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Moves the contents of `src` into `dst`, skipping entries whose name is
/// listed in `exclude`. Returns how many entries were moved.
pub fn move_dir_contents(src: &Path, dst: &Path, exclude: &[&OsStr]) -> io::Result<usize> {
    fs::create_dir_all(dst)?;
    let mut moved = 0;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        if exclude.contains(&entry.file_name().as_os_str()) {
            continue;
        }
        let target = dst.join(entry.file_name());
        if fs::rename(&path, &target).is_err() {
            // Rename does not cross filesystems; fall back to copy and delete.
            if entry.file_type()?.is_dir() {
                copy_dir_recursive(&path, &target)?;
                fs::remove_dir_all(&path)?;
            } else {
                fs::copy(&path, &target)?;
                fs::remove_file(&path)?;
            }
        }
        moved += 1;
    }
    Ok(moved)
}

/// Removes every entry inside `dir`, keeping the directory itself. Returns
/// how many entries were removed.
pub fn clear_dir(dir: &Path) -> io::Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
        removed += 1;
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn write_file(path: &Path, contents: &str) {
        let mut file = File::create(path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn copy_dir_recursive_copies_nested_trees() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        write_file(&src.join("top.txt"), "top");
        write_file(&src.join("nested").join("inner.txt"), "inner");

        let dst = tmp.path().join("dst");
        copy_dir_recursive(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("top.txt")).unwrap(), "top");
        assert_eq!(
            fs::read_to_string(dst.join("nested").join("inner.txt")).unwrap(),
            "inner"
        );
    }

    #[test]
    fn replace_dir_overwrites_previous_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        write_file(&src.join("new.txt"), "new");

        let dst = tmp.path().join("dst");
        fs::create_dir_all(&dst).unwrap();
        write_file(&dst.join("stale.txt"), "stale");

        replace_dir(&src, &dst).unwrap();

        assert!(!dst.join("stale.txt").exists());
        assert_eq!(fs::read_to_string(dst.join("new.txt")).unwrap(), "new");
        assert!(!staging_path(&dst).exists());
    }

    #[test]
    fn replace_dir_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        write_file(&src.join("a.txt"), "a");

        let dst = tmp.path().join("dst");
        replace_dir(&src, &dst).unwrap();
        replace_dir(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("a.txt")).unwrap(), "a");
        assert_eq!(fs::read_dir(&dst).unwrap().count(), 1);
    }

    #[test]
    fn move_dir_contents_respects_exclusions() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("mch")).unwrap();
        fs::create_dir_all(src.join("asm.base")).unwrap();
        write_file(&src.join("mch").join("big.mch"), "collection");
        write_file(&src.join("replay.log"), "log");

        let dst = tmp.path().join("dst");
        let moved = move_dir_contents(&src, &dst, &[OsStr::new("mch")]).unwrap();

        assert_eq!(moved, 2);
        assert!(src.join("mch").join("big.mch").exists());
        assert!(!src.join("replay.log").exists());
        assert!(dst.join("replay.log").exists());
        assert!(dst.join("asm.base").exists());
    }

    #[test]
    fn clear_dir_empties_but_keeps_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("work");
        fs::create_dir_all(dir.join("sub")).unwrap();
        write_file(&dir.join("file.txt"), "x");

        let removed = clear_dir(&dir).unwrap();

        assert_eq!(removed, 2);
        assert!(dir.exists());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn remove_dir_if_exists_reports_presence() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("gone");
        assert!(!remove_dir_if_exists(&dir).unwrap());
        fs::create_dir_all(&dir).unwrap();
        assert!(remove_dir_if_exists(&dir).unwrap());
        assert!(!dir.exists());
    }
}
