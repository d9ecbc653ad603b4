//! Reading just enough of a compose file and its `.env` to report published host ports.

use std::collections::{BTreeMap, HashMap};

use regex::Regex;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComposeFile {
    #[serde(default)]
    pub services: BTreeMap<String, ComposeService>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComposeService {
    #[serde(default)]
    pub ports: Vec<serde_yaml::Value>,
}

impl ComposeFile {
    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Host ports published by all services, in service-name order.
    pub fn host_ports(&self, env: &EnvResolver) -> Vec<u16> {
        self.services
            .values()
            .flat_map(|service| service.ports.iter())
            .filter_map(|port| match port {
                serde_yaml::Value::String(s) => env.host_port(s),
                _ => None,
            })
            .collect()
    }
}

/// Parses `KEY=value` lines, skipping blanks and comments.
pub fn parse_env(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

/// Substitutes `${VAR}` and `$VAR` references from an app's `.env`.
#[derive(Debug, Clone)]
pub struct EnvResolver {
    pattern: Regex,
    vars: HashMap<String, String>,
}

impl EnvResolver {
    /// # Errors
    ///
    /// Returns an error if the substitution pattern fails to compile (unlikely).
    pub fn new(vars: HashMap<String, String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(r"\$\{([^}]+)\}|\$([A-Z_][A-Z0-9_]*)")?,
            vars,
        })
    }

    /// Unknown references are left untouched.
    pub fn resolve(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
                self.vars
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    /// Host side of `8080:80`, `127.0.0.1:8080:80` or `${PORT}:80`.
    pub fn host_port(&self, mapping: &str) -> Option<u16> {
        let resolved = self.resolve(mapping);
        let parts: Vec<&str> = resolved.split(':').collect();
        let candidate = match parts.as_slice() {
            [host, _] | [_, host, _] => host,
            _ => return None,
        };
        candidate.trim().parse::<u16>().ok().filter(|p| *p > 0)
    }
}

/// One-line summary of where an installed app can be reached.
pub fn describe_ports(ports: &[u16]) -> String {
    match ports {
        [] => "no published host ports".to_string(),
        [port] => format!("running at http://localhost:{port}"),
        many => format!(
            "running on ports {}",
            many.iter()
                .map(u16::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(pairs: &[(&str, &str)]) -> EnvResolver {
        EnvResolver::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn parses_env_file() {
        let vars = parse_env("# comment\nAPP_PORT = 6875\n\nDB_PASSWORD=s3cr=t\n");
        assert_eq!(vars.get("APP_PORT").map(String::as_str), Some("6875"));
        assert_eq!(vars.get("DB_PASSWORD").map(String::as_str), Some("s3cr=t"));
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn resolves_both_reference_styles() {
        let env = resolver(&[("PORT", "8080"), ("HOST", "127.0.0.1")]);
        assert_eq!(env.resolve("${HOST}:$PORT:80"), "127.0.0.1:8080:80");
        assert_eq!(env.resolve("${MISSING}:80"), "${MISSING}:80");
    }

    #[test]
    fn extracts_host_ports() {
        let env = resolver(&[("APP_PORT", "6875")]);
        assert_eq!(env.host_port("8080:80"), Some(8080));
        assert_eq!(env.host_port("127.0.0.1:3001:3001"), Some(3001));
        assert_eq!(env.host_port("${APP_PORT}:80"), Some(6875));
        assert_eq!(env.host_port("${UNSET}:80"), None);
        assert_eq!(env.host_port("80"), None);
    }

    #[test]
    fn compose_ports_across_services() {
        let compose = ComposeFile::parse(
            "services:\n  web:\n    image: nginx\n    ports:\n      - \"${WEB_PORT}:80\"\n  db:\n    image: mariadb\n  admin:\n    ports:\n      - \"9000:9000\"\n",
        )
        .unwrap();
        let ports = compose.host_ports(&resolver(&[("WEB_PORT", "8081")]));
        assert_eq!(ports, vec![9000, 8081]);
        assert_eq!(describe_ports(&ports), "running on ports 9000, 8081");
        assert_eq!(describe_ports(&[8081]), "running at http://localhost:8081");
        assert_eq!(describe_ports(&[]), "no published host ports");
    }
}
