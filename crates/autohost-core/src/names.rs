//! Helpers for turning user-supplied host names into zone and file names.

/// Splits `app.maza-server` into `("app", "maza-server")` at the first dot.
///
/// Returns `None` when either side would be empty.
pub fn split_host_zone(fqdn: &str) -> Option<(&str, &str)> {
    let (host, zone) = fqdn.trim().split_once('.')?;
    if host.is_empty() || zone.is_empty() {
        return None;
    }
    Some((host, zone))
}

/// File-system safe rendering of a host name: lowercased, with `/` and `:` replaced by `_`.
pub fn safe_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '/' || c == ':' { '_' } else { c })
        .collect()
}

/// Splits a comma-separated flag value, dropping empty entries.
pub fn split_and_trim(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_at_first_dot() {
        assert_eq!(
            split_host_zone("app.maza-server"),
            Some(("app", "maza-server"))
        );
        assert_eq!(
            split_host_zone(" api.home.lan "),
            Some(("api", "home.lan"))
        );
        assert_eq!(split_host_zone("localhost"), None);
        assert_eq!(split_host_zone(".zone"), None);
        assert_eq!(split_host_zone("host."), None);
    }

    #[test]
    fn safe_name_replaces_separators() {
        assert_eq!(safe_name("App.Zone:8080/x"), "app.zone_8080_x");
    }

    #[test]
    fn split_and_trim_drops_blanks() {
        assert_eq!(
            split_and_trim(" 100.64.0.1, ,1.1.1.1 "),
            vec!["100.64.0.1".to_string(), "1.1.1.1".to_string()]
        );
        assert!(split_and_trim("  ").is_empty());
    }
}
