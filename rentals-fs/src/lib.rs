//! UTF-8 filesystem helpers built on `cap-std` and `camino`.
//!
//! Paths handed in from configuration are resolved with ambient authority
//! once; everything below them is then accessed through capability handles.
#![forbid(unsafe_code)]

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8};
use std::io;

/// Open a file for reading using ambient authority.
///
/// # Errors
///
/// Returns the I/O error raised while opening `path`.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Open a directory handle using ambient authority.
///
/// # Errors
///
/// Returns the I/O error raised while opening `path`.
pub fn open_dir(path: &Utf8Path) -> io::Result<fs_utf8::Dir> {
    fs_utf8::Dir::open_ambient_dir(path, ambient_authority())
}

/// Create `path` and any missing ancestors, then return a handle to it.
///
/// The whole path is resolved with ambient authority, so `..` components and
/// symlinked ancestors behave as they do for [`std::fs::create_dir_all`].
///
/// # Errors
///
/// Returns the underlying I/O error when a directory cannot be created or
/// the result cannot be opened.
pub fn create_dir_all(path: &Utf8Path) -> io::Result<fs_utf8::Dir> {
    fs_utf8::Dir::create_ambient_dir_all(path, ambient_authority())?;
    open_dir(path)
}

/// Open the parent directory of `path` and return it with the file name.
///
/// # Errors
///
/// Fails when `path` has no file name or its parent cannot be opened.
pub fn open_parent(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} does not name a file")))?
        .to_owned();
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    Ok((open_dir(parent)?, file_name))
}

/// Report whether `path` is a directory.
///
/// A missing path is reported as an [`io::ErrorKind::NotFound`] error so
/// callers can tell "absent" apart from "wrong kind".
///
/// # Errors
///
/// Returns [`io::ErrorKind::NotFound`] for a missing path and the underlying
/// error when the path cannot be inspected.
pub fn is_dir(path: &Utf8Path) -> io::Result<bool> {
    open_dir(path).map(|_| true).or_else(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            Err(err)
        } else {
            open_parent(path)
                .and_then(|(dir, name)| dir.metadata(name.as_str()))
                .map(|meta| meta.is_dir())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::rstest;
    use std::{fs, io::Read};
    use tempfile::TempDir;

    fn utf8_root(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 temp dir")
    }

    #[rstest]
    fn creates_nested_directories() {
        let tmp = TempDir::new().expect("tempdir");
        let nested = utf8_root(&tmp).join("store").join("sample.csv");
        let dir = create_dir_all(&nested).expect("create nested");
        dir.write("marker.txt", b"ok").expect("write through handle");
        assert!(nested.join("marker.txt").as_std_path().is_file());
        assert!(is_dir(&nested).expect("inspect"));
    }

    #[rstest]
    fn creates_directories_through_parent_components() {
        let tmp = TempDir::new().expect("tempdir");
        let root = utf8_root(&tmp);
        fs::create_dir(root.join("work")).expect("create sibling");
        let climbing = root.join("work").join("..").join("store");
        create_dir_all(&climbing).expect("create via ..");
        assert!(root.join("store").as_std_path().is_dir());
    }

    #[cfg(unix)]
    #[rstest]
    fn creates_directories_below_a_symlink() {
        let tmp = TempDir::new().expect("tempdir");
        let root = utf8_root(&tmp);
        fs::create_dir(root.join("real")).expect("create target");
        std::os::unix::fs::symlink(root.join("real"), root.join("link")).expect("symlink");
        let dir = create_dir_all(&root.join("link").join("store")).expect("create via symlink");
        dir.write("marker.txt", b"ok").expect("write through handle");
        assert!(root.join("real/store/marker.txt").as_std_path().is_file());
    }

    #[rstest]
    fn reports_directory_kinds() {
        let tmp = TempDir::new().expect("tempdir");
        let root = utf8_root(&tmp);
        let file = root.join("sample.csv");
        fs::write(&file, "price\n1\n").expect("write sample");

        assert!(is_dir(&root).expect("inspect dir"));
        assert!(!is_dir(&file).expect("inspect file as dir"));

        let missing = is_dir(&root.join("absent")).expect_err("missing dir");
        assert_eq!(missing.kind(), io::ErrorKind::NotFound);
    }

    #[rstest]
    fn opens_files_for_reading() {
        let tmp = TempDir::new().expect("tempdir");
        let file = utf8_root(&tmp).join("sample.csv");
        fs::write(&file, "price\n").expect("write sample");
        let mut contents = String::new();
        open_utf8_file(&file)
            .expect("open")
            .read_to_string(&mut contents)
            .expect("read");
        assert_eq!(contents, "price\n");
    }
}
