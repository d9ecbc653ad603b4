//! Templated application stacks installed under `<root>/apps/<name>`.

use crate::docker;
use crate::fs::{atomic_write, write_if_missing};
use crate::paths::AutohostPaths;
use anyhow::{Context, Result};
use autohost_core::compose::{ComposeFile, EnvResolver, parse_env};
use autohost_core::template::{placeholders, replace_placeholders};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::distributions::Alphanumeric;
use rand::{Rng, RngCore};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

const COMPOSE_FILE: &str = "docker-compose.yml";
const EMPTY_ENV: &str = "# Generated by autohost\n";

#[derive(Debug)]
pub struct AppTemplate {
    pub name: &'static str,
    pub compose: &'static str,
    pub env_example: Option<&'static str>,
}

pub const EMBEDDED: &[AppTemplate] = &[
    AppTemplate {
        name: "bookstack",
        compose: include_str!("../assets/apps/bookstack/docker-compose.yml"),
        env_example: Some(include_str!("../assets/apps/bookstack/.env.example")),
    },
    AppTemplate {
        name: "nextcloud",
        compose: include_str!("../assets/apps/nextcloud/docker-compose.yml"),
        env_example: Some(include_str!("../assets/apps/nextcloud/.env.example")),
    },
    AppTemplate {
        name: "uptime-kuma",
        compose: include_str!("../assets/apps/uptime-kuma/docker-compose.yml"),
        env_example: None,
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Embedded,
    Custom(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvFile {
    Generated,
    Empty,
    Kept,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppListing {
    pub name: String,
    pub source: TemplateSource,
    pub installed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installed {
    pub dir: PathBuf,
    pub source: TemplateSource,
    pub env: EnvFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Running,
    Stopped,
}

pub fn embedded(name: &str) -> Option<&'static AppTemplate> {
    EMBEDDED.iter().find(|t| t.name == name)
}

/// Embedded templates plus custom ones under `<root>/templates/<app>/docker-compose.yml`.
pub fn list(paths: &AutohostPaths) -> Result<Vec<AppListing>> {
    let mut apps: BTreeMap<String, TemplateSource> = EMBEDDED
        .iter()
        .map(|t| (t.name.to_string(), TemplateSource::Embedded))
        .collect();

    let templates = paths.templates_dir();
    if templates.is_dir() {
        for entry in std::fs::read_dir(&templates)
            .with_context(|| format!("Failed to list {}", templates.display()))?
        {
            let entry = entry?;
            let compose = entry.path().join(COMPOSE_FILE);
            if compose.is_file() {
                let name = entry.file_name().to_string_lossy().into_owned();
                apps.entry(name).or_insert(TemplateSource::Custom(compose));
            }
        }
    }

    Ok(apps
        .into_iter()
        .map(|(name, source)| AppListing {
            installed: paths.app_dir(&name).join(COMPOSE_FILE).is_file(),
            name,
            source,
        })
        .collect())
}

/// Writes the compose file and, once, the `.env` generated from the template's example.
pub fn install(paths: &AutohostPaths, app: &str) -> Result<Installed> {
    validate_name(app)?;
    let dir = paths.app_dir(app);

    let (compose, env_example, source) = match embedded(app) {
        Some(t) => (t.compose.to_string(), t.env_example.map(str::to_string), TemplateSource::Embedded),
        None => {
            let custom = paths.templates_dir().join(app).join(COMPOSE_FILE);
            let compose = match std::fs::read_to_string(&custom) {
                Ok(c) => c,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => anyhow::bail!(
                    "no template for `{app}`: it is not built in and {} does not exist",
                    custom.display()
                ),
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to read {}", custom.display()));
                }
            };
            let example = custom.with_file_name(".env.example");
            let env_example = std::fs::read_to_string(&example).ok();
            (compose, env_example, TemplateSource::Custom(custom))
        }
    };

    atomic_write(dir.join(COMPOSE_FILE), compose)?;

    let env_path = dir.join(".env");
    let env = if env_path.exists() {
        EnvFile::Kept
    } else if let Some(example) = env_example {
        write_env(&env_path, &render_env(&example))?;
        EnvFile::Generated
    } else {
        write_env(&env_path, EMPTY_ENV)?;
        EnvFile::Empty
    };

    info!(app, dir = %dir.display(), "installed app");
    Ok(Installed { dir, source, env })
}

fn write_env(path: &Path, content: &str) -> Result<()> {
    write_if_missing(path, content)?;
    crate::fs::set_mode(path, 0o600)
}

/// Fills `{{APP_KEY}}` with a Laravel-style key and password-like placeholders with random
/// secrets. Other placeholders are left for the user.
pub fn render_env(example: &str) -> String {
    let values: BTreeMap<String, String> = placeholders(example)
        .into_iter()
        .filter_map(|key| {
            let value = if key == "APP_KEY" {
                generate_app_key()
            } else if key.ends_with("PASSWORD") || key.ends_with("SECRET") {
                generate_secret(24)
            } else {
                return None;
            };
            Some((key, value))
        })
        .collect();
    replace_placeholders(example, &values)
}

/// `base64:` followed by 32 random bytes, base64 encoded.
pub fn generate_app_key() -> String {
    let mut key = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut key);
    format!("base64:{}", STANDARD.encode(key))
}

pub fn generate_secret(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn validate_name(app: &str) -> Result<()> {
    if app.is_empty()
        || app.starts_with('.')
        || app.contains(|c: char| c == '/' || c == '\\' || c.is_whitespace())
    {
        anyhow::bail!("invalid app name `{app}`");
    }
    Ok(())
}

/// Compose file of an installed app.
pub fn compose_path(paths: &AutohostPaths, app: &str) -> Result<PathBuf> {
    validate_name(app)?;
    let path = paths.app_dir(app).join(COMPOSE_FILE);
    if !path.is_file() {
        anyhow::bail!(
            "`{app}` is not installed ({} does not exist); run `autohost app install {app}`",
            path.display()
        );
    }
    Ok(path)
}

pub fn start(paths: &AutohostPaths, app: &str) -> Result<()> {
    let compose = compose_path(paths, app)?;
    docker::compose(&compose).args(["up", "-d"]).run()
}

pub fn stop(paths: &AutohostPaths, app: &str) -> Result<()> {
    let compose = compose_path(paths, app)?;
    docker::compose(&compose).arg("stop").run()
}

pub fn remove(paths: &AutohostPaths, app: &str) -> Result<()> {
    let compose = compose_path(paths, app)?;
    docker::compose(&compose).arg("down").run()
}

pub fn status(paths: &AutohostPaths, app: &str) -> Result<AppState> {
    let compose = compose_path(paths, app)?;
    let running = docker::compose(&compose)
        .args(["ps", "--status", "running", "--quiet"])
        .output()?;
    Ok(if running.is_empty() {
        AppState::Stopped
    } else {
        AppState::Running
    })
}

/// Host ports the app publishes, with `${VAR}` references resolved against its `.env`.
pub fn ports(paths: &AutohostPaths, app: &str) -> Result<Vec<u16>> {
    let compose_file = compose_path(paths, app)?;
    let compose = std::fs::read_to_string(&compose_file)
        .with_context(|| format!("Failed to read {}", compose_file.display()))?;
    let compose = ComposeFile::parse(&compose)
        .with_context(|| format!("Failed to parse {}", compose_file.display()))?;

    let env = std::fs::read_to_string(paths.app_dir(app).join(".env"))
        .map(|s| parse_env(&s))
        .unwrap_or_default();
    Ok(compose.host_ports(&EnvResolver::new(env)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_templates_parse() {
        for template in EMBEDDED {
            ComposeFile::parse(template.compose)
                .unwrap_or_else(|e| panic!("{}: {e}", template.name));
        }
    }

    #[test]
    fn app_key_shape() {
        let key = generate_app_key();
        let encoded = key.strip_prefix("base64:").unwrap();
        assert_eq!(STANDARD.decode(encoded).unwrap().len(), 32);
        assert_eq!(generate_secret(24).len(), 24);
    }

    #[test]
    fn render_env_fills_known_placeholders() {
        let rendered = render_env("APP_KEY={{APP_KEY}}\nDB_PASSWORD={{DB_PASSWORD}}\nMAIL={{MAIL_HOST}}\n");
        assert!(!rendered.contains("{{APP_KEY}}"));
        assert!(!rendered.contains("{{DB_PASSWORD}}"));
        assert!(rendered.contains("MAIL={{MAIL_HOST}}"));
    }

    #[test]
    fn install_generates_env_once_and_detects_ports() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AutohostPaths::new(dir.path());

        let first = install(&paths, "bookstack").unwrap();
        assert_eq!(first.source, TemplateSource::Embedded);
        assert_eq!(first.env, EnvFile::Generated);
        let env = std::fs::read_to_string(first.dir.join(".env")).unwrap();
        assert!(env.contains("APP_KEY=base64:"));

        let second = install(&paths, "bookstack").unwrap();
        assert_eq!(second.env, EnvFile::Kept);
        assert_eq!(std::fs::read_to_string(first.dir.join(".env")).unwrap(), env);

        assert_eq!(ports(&paths, "bookstack").unwrap(), vec![6875]);
    }

    #[test]
    fn custom_template_fallback_and_listing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AutohostPaths::new(dir.path());
        let custom = paths.templates_dir().join("whoami");
        std::fs::create_dir_all(&custom).unwrap();
        std::fs::write(
            custom.join(COMPOSE_FILE),
            "services:\n  whoami:\n    image: traefik/whoami\n    ports:\n      - \"8088:80\"\n",
        )
        .unwrap();

        let installed = install(&paths, "whoami").unwrap();
        assert!(matches!(installed.source, TemplateSource::Custom(_)));
        assert_eq!(installed.env, EnvFile::Empty);
        assert_eq!(ports(&paths, "whoami").unwrap(), vec![8088]);

        let listing = list(&paths).unwrap();
        let names: Vec<_> = listing.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["bookstack", "nextcloud", "uptime-kuma", "whoami"]);
        assert!(listing.iter().find(|a| a.name == "whoami").unwrap().installed);
        assert!(!listing.iter().find(|a| a.name == "nextcloud").unwrap().installed);
    }

    #[test]
    fn unknown_and_invalid_names_fail() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AutohostPaths::new(dir.path());
        assert!(install(&paths, "nope").is_err());
        assert!(install(&paths, "../etc").is_err());
        assert!(compose_path(&paths, "bookstack").is_err());
    }
}
