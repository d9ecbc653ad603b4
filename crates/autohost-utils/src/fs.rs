use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Replaces `path` by writing a sibling temporary file and renaming it over the original.
///
/// Parent directories are created as needed.
pub fn atomic_write(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
    let path = path.as_ref();
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create {}", parent.display()))?;

    let file_name = path
        .file_name()
        .with_context(|| format!("{} has no file name", path.display()))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(format!(".tmp-{}", std::process::id()));
    let tmp = parent.join(tmp_name);

    let write = || -> Result<()> {
        let mut file = std::fs::File::create(&tmp)
            .with_context(|| format!("Failed to create {}", tmp.display()))?;
        file.write_all(contents.as_ref())
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        file.sync_all()
            .with_context(|| format!("Failed to sync {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace {}", path.display()))
    };

    if let Err(e) = write() {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    debug!(path = %path.display(), "wrote file");
    Ok(())
}

/// Writes `contents` only when `path` does not exist yet. Returns whether it wrote.
pub fn write_if_missing(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<bool> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(false);
    }
    atomic_write(path, contents)?;
    Ok(true)
}

/// Appends `line` unless some line of the file already equals it. A missing file is created.
pub fn ensure_line_in_file(path: impl AsRef<Path>, line: &str) -> Result<bool> {
    let path = path.as_ref();
    let existing = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    if existing.lines().any(|l| l.trim() == line.trim()) {
        return Ok(false);
    }

    let mut updated = existing;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(line);
    updated.push('\n');
    atomic_write(path, updated)?;
    Ok(true)
}

pub fn copy_dir_recursive(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if !src.is_dir() {
        anyhow::bail!("template directory does not exist: {}", src.display());
    }

    std::fs::create_dir_all(dst)?;

    for entry in walkdir::WalkDir::new(src).follow_links(false) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(src)?;
        let out = dst.join(rel);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&out)?;
            continue;
        }

        if entry.file_type().is_symlink() {
            #[cfg(unix)]
            {
                let target = std::fs::read_link(entry.path())?;
                let _ = std::fs::remove_file(&out);
                std::os::unix::fs::symlink(target, &out)?;
            }
            continue;
        }

        if entry.file_type().is_file() {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &out)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
        }
    }

    Ok(())
}

#[cfg(unix)]
pub fn set_mode(path: impl AsRef<Path>, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let path = path.as_ref();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .with_context(|| format!("Failed to chmod {}", path.display()))
}

#[cfg(not(unix))]
pub fn set_mode(_path: impl AsRef<Path>, _mode: u32) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_replaces_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("Corefile");

        atomic_write(&path, "one").unwrap();
        atomic_write(&path, "two").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");
        let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("Corefile")]);
    }

    #[test]
    fn ensure_line_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Caddyfile");
        std::fs::write(&path, ":80 {\n}").unwrap();

        assert!(ensure_line_in_file(&path, "import /x/*.caddy").unwrap());
        assert!(!ensure_line_in_file(&path, "import /x/*.caddy").unwrap());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            ":80 {\n}\nimport /x/*.caddy\n"
        );
    }

    #[test]
    fn write_if_missing_keeps_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        assert!(write_if_missing(&path, "A=1\n").unwrap());
        assert!(!write_if_missing(&path, "A=2\n").unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "A=1\n");
    }

    #[test]
    fn copies_nested_directories() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(src.path().join("conf")).unwrap();
        std::fs::write(src.path().join("docker-compose.yml"), "services: {}\n").unwrap();
        std::fs::write(src.path().join("conf/app.ini"), "x=1\n").unwrap();

        copy_dir_recursive(src.path(), dst.path().join("out")).unwrap();
        assert!(dst.path().join("out/docker-compose.yml").is_file());
        assert_eq!(
            std::fs::read_to_string(dst.path().join("out/conf/app.ini")).unwrap(),
            "x=1\n"
        );
        assert!(copy_dir_recursive(src.path().join("missing"), dst.path()).is_err());
    }
}
