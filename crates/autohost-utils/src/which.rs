use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
#[error("`{0}` is not installed or not in PATH")]
pub struct MissingBinary(pub String);

pub fn which(bin: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path) {
        let candidate = dir.join(bin);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

pub fn require(bin: &str) -> Result<PathBuf, MissingBinary> {
    which(bin).ok_or_else(|| MissingBinary(bin.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_sh_and_reports_missing() {
        assert!(which("sh").is_some());
        let err = require("autohost-definitely-missing-binary").unwrap_err();
        assert_eq!(
            err.to_string(),
            "`autohost-definitely-missing-binary` is not installed or not in PATH"
        );
    }
}
