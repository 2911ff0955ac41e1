//! Resolution of the external sync executable

use ferrosync_types::{Error, Result};
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve `program` to the absolute path of an executable file
///
/// A name containing a path separator is taken as a path (a leading `~` is
/// expanded). A bare name is searched for in the directories of `PATH`, in
/// order.
pub fn locate(program: &str) -> Result<PathBuf> {
    let search_path = env::var_os("PATH").unwrap_or_default();
    locate_in(program, env::split_paths(&search_path))
}

/// Like [`locate`], searching `dirs` instead of `PATH` for bare names
pub fn locate_in<I, P>(program: &str, dirs: I) -> Result<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let not_found = || Error::ExecutableNotFound {
        name: program.to_string(),
    };

    if program.is_empty() {
        return Err(not_found());
    }

    if program.contains(std::path::is_separator) {
        let expanded = shellexpand::tilde(program);
        let candidate = absolute_path(Path::new(&*expanded))?;
        return if is_executable(&candidate) {
            Ok(candidate)
        } else {
            Err(not_found())
        };
    }

    for dir in dirs {
        let Some(dir) = strip_quotes(dir.as_ref()) else {
            continue;
        };
        let candidate = dir.join(program);
        if is_executable(&candidate) {
            debug!("Resolved {} to {}", program, candidate.display());
            return absolute_path(&candidate);
        }
    }

    Err(not_found())
}

/// Make `path` absolute against the current directory without resolving links
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

fn strip_quotes(dir: &Path) -> Option<PathBuf> {
    let raw: OsString = dir.as_os_str().to_owned();
    let trimmed = match raw.to_str() {
        Some(s) => PathBuf::from(s.trim_matches('"')),
        None => PathBuf::from(raw),
    };
    if trimmed.as_os_str().is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn is_executable(path: &Path) -> bool {
    // metadata() follows symlinks, so a link to a binary counts
    let Ok(metadata) = path.metadata() else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[test]
    fn test_search_in_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write_file(first.path(), "fake-rsync", 0o644);
        let expected = write_file(second.path(), "fake-rsync", 0o755);

        let found = locate_in("fake-rsync", [first.path(), second.path()]).unwrap();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_first_match_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let expected = write_file(first.path(), "fake-rsync", 0o755);
        write_file(second.path(), "fake-rsync", 0o755);

        let found = locate_in("fake-rsync", [first.path(), second.path()]).unwrap();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_quoted_and_empty_entries() {
        let dir = TempDir::new().unwrap();
        let expected = write_file(dir.path(), "fake-rsync", 0o755);
        let quoted = PathBuf::from(format!("\"{}\"", dir.path().display()));

        let found = locate_in("fake-rsync", [PathBuf::new(), quoted]).unwrap();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_explicit_path() {
        let dir = TempDir::new().unwrap();
        let expected = write_file(dir.path(), "fake-rsync", 0o700);

        let found = locate_in(expected.to_str().unwrap(), Vec::<PathBuf>::new()).unwrap();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_explicit_path_not_executable() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "fake-rsync", 0o644);

        let result = locate_in(path.to_str().unwrap(), Vec::<PathBuf>::new());
        assert!(matches!(result, Err(Error::ExecutableNotFound { .. })));
    }

    #[test]
    fn test_directory_is_not_executable() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("fake-rsync")).unwrap();

        let result = locate_in("fake-rsync", [dir.path()]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_program() {
        let dir = TempDir::new().unwrap();
        let error = locate_in("definitely-not-a-sync-tool", [dir.path()]).unwrap_err();
        assert_eq!(
            error.to_string(),
            "definitely-not-a-sync-tool not exists or not executable"
        );
    }

    #[test]
    fn test_symlink_to_executable() {
        let dir = TempDir::new().unwrap();
        let target = write_file(dir.path(), "real-rsync", 0o755);
        let link = dir.path().join("rsync-link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let found = locate_in("rsync-link", [dir.path()]).unwrap();
        assert_eq!(found, link);
    }

    #[test]
    fn test_tilde_path_resolves_under_home() {
        let Some(home) = std::env::var_os("HOME").map(PathBuf::from) else {
            return;
        };
        let Ok(dir) = TempDir::new_in(&home) else {
            return;
        };
        let expected = write_file(dir.path(), "fake-rsync", 0o755);
        let relative = expected.strip_prefix(&home).unwrap();

        let found = locate_in(
            &format!("~/{}", relative.display()),
            Vec::<PathBuf>::new(),
        )
        .unwrap();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_absolute_path() {
        let abs = absolute_path(Path::new("repo")).unwrap();
        assert!(abs.is_absolute());
        assert!(abs.ends_with("repo"));
    }
}
