//! Minimal `/etc/os-release` parsing, enough to pick a package manager.

use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
    pub id: String,
    pub id_like: String,
}

/// Distribution families with a known way to install `curl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistroFamily {
    Debian,
    RedHat,
    Fedora,
    Amazon,
    Alpine,
    Suse,
    Unknown,
}

impl OsRelease {
    pub fn parse(content: &str) -> Self {
        let values: HashMap<&str, &str> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(k, v)| (k.trim(), v.trim().trim_matches(['"', '\''])))
            .collect();

        Self {
            id: values.get("ID").copied().unwrap_or_default().to_string(),
            id_like: values.get("ID_LIKE").copied().unwrap_or_default().to_string(),
        }
    }

    pub fn family(&self) -> DistroFamily {
        let ids = format!("{} {}", self.id, self.id_like).to_lowercase();
        let has = |needle: &str| ids.contains(needle);

        if has("debian") || has("ubuntu") {
            DistroFamily::Debian
        } else if has("rhel") || has("centos") || has("rocky") || has("almalinux") {
            DistroFamily::RedHat
        } else if has("fedora") {
            DistroFamily::Fedora
        } else if has("amzn") {
            DistroFamily::Amazon
        } else if has("alpine") {
            DistroFamily::Alpine
        } else if has("suse") || has("sles") {
            DistroFamily::Suse
        } else {
            DistroFamily::Unknown
        }
    }
}

impl DistroFamily {
    /// Shell snippet installing `curl` and CA certificates, if the family is known.
    pub fn curl_install_script(self) -> Option<&'static str> {
        match self {
            Self::Debian => Some(
                "sudo apt-get update -y && sudo apt-get install -y curl ca-certificates && sudo update-ca-certificates",
            ),
            Self::RedHat | Self::Amazon => Some(
                "sudo yum install -y curl ca-certificates || sudo dnf install -y curl ca-certificates",
            ),
            Self::Fedora => Some("sudo dnf install -y curl ca-certificates"),
            Self::Alpine => {
                Some("sudo apk add --no-cache curl ca-certificates && sudo update-ca-certificates")
            }
            Self::Suse => Some("sudo zypper --non-interactive install -y curl ca-certificates"),
            Self::Unknown => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ubuntu_is_debian_family() {
        let release = OsRelease::parse(
            "NAME=\"Ubuntu\"\nID=ubuntu\nID_LIKE=debian\n# comment\nVERSION_ID=\"24.04\"\n",
        );
        assert_eq!(release.id, "ubuntu");
        assert_eq!(release.id_like, "debian");
        assert_eq!(release.family(), DistroFamily::Debian);
    }

    #[test]
    fn rocky_and_unknown() {
        let rocky = OsRelease::parse("ID=\"rocky\"\nID_LIKE=\"rhel centos fedora\"\n");
        assert_eq!(rocky.family(), DistroFamily::RedHat);
        assert_eq!(OsRelease::parse("").family(), DistroFamily::Unknown);
        assert!(DistroFamily::Unknown.curl_install_script().is_none());
    }
}
