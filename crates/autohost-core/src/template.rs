//! Renderers for the files autohost writes on behalf of other tools.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

/// Written next to the Terraform state so it is never committed.
pub const TERRAFORM_GITIGNORE: &str = "*.tfstate\n*.tfstate.backup\n.terraform/\n.terraform.lock.hcl\n";

/// Initial content of `<root>/caddy/Caddyfile`.
pub const CADDYFILE_HEADER: &str = "# Caddy configuration managed by autohost\n# Example:\n# plex.localhost {\n#     reverse_proxy 127.0.0.1:32400\n# }\n";

/// Site file for `autohost expose`: `fqdn` proxied to a local port.
pub fn caddy_site(host: &str, port: u16) -> String {
    format!("{host} {{\n\tencode zstd gzip\n\treverse_proxy localhost:{port}\n}}\n")
}

/// Block appended by `autohost caddy add-service`.
pub fn caddy_service_block(host: &str, port: u16) -> String {
    format!("\n{host} {{\n    reverse_proxy 127.0.0.1:{port}\n}}\n")
}

/// Line the master Caddyfile needs in order to load generated sites.
pub fn caddy_import_line(sites_dir: &Path) -> String {
    format!("import {}/*.caddy", sites_dir.display())
}

pub fn cloudflared_config(
    tunnel: &str,
    credentials_file: &Path,
    hostname: &str,
    service: &str,
) -> String {
    format!(
        "tunnel: {tunnel}\ncredentials-file: {}\ningress:\n  - hostname: {hostname}\n    service: {service}\n  - service: http_status:404\n",
        credentials_file.display()
    )
}

/// GitHub Actions workflow deploying the repository's compose stack on a self-hosted runner.
pub fn deploy_workflow(branch: &str) -> String {
    format!(
        r#"name: Deploy to Home Server

on:
  push:
    branches: [ "{branch}" ]

jobs:
  deploy:
    runs-on: self-hosted
    steps:
      - name: Checkout repository
        uses: actions/checkout@v4

      - name: Stop existing containers
        run: |
          docker compose down || true

      - name: Build and start containers
        run: |
          docker compose up --build -d
"#
    )
}

/// Inputs of the split-DNS Terraform workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitDnsPlan {
    pub domain: String,
    pub nameservers: Vec<String>,
    pub search_paths: Vec<String>,
}

pub fn terraform_main_tf(plan: &SplitDnsPlan, provider_version: &str) -> String {
    let mut tf = String::new();
    let _ = write!(
        tf,
        r#"terraform {{
  required_providers {{
    tailscale = {{
      source  = "tailscale/tailscale"
      version = {provider}
    }}
  }}
}}

# Credentials come from TAILSCALE_API_KEY and TAILSCALE_TAILNET.
provider "tailscale" {{}}

resource "tailscale_dns_split_nameservers" "split" {{
  domain      = {domain}
  nameservers = [{nameservers}]
}}
"#,
        provider = quote(provider_version),
        domain = quote(&plan.domain),
        nameservers = quote_join(&plan.nameservers),
    );

    if !plan.search_paths.is_empty() {
        let _ = write!(
            tf,
            r#"
resource "tailscale_dns_search_paths" "paths" {{
  search_paths = [{}]
}}
"#,
            quote_join(&plan.search_paths)
        );
    }
    tf
}

/// Replaces every `{{KEY}}` with its value; unknown placeholders are kept.
pub fn replace_placeholders(content: &str, values: &BTreeMap<String, String>) -> String {
    values.iter().fold(content.to_string(), |out, (key, value)| {
        out.replace(&format!("{{{{{key}}}}}"), value)
    })
}

/// Names of the `{{KEY}}` placeholders present in `content`, in order of first appearance.
pub fn placeholders(content: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut rest = content;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            break;
        };
        let key = &after[..end];
        if !key.is_empty()
            && key.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
            && !found.iter().any(|k| k == key)
        {
            found.push(key.to_string());
        }
        rest = &after[end + 2..];
    }
    found
}

fn quote(value: &str) -> String {
    format!("{value:?}")
}

fn quote_join(items: &[String]) -> String {
    items
        .iter()
        .map(|s| quote(s))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caddy_site_uses_tabs() {
        assert_eq!(
            caddy_site("app.maza-server", 3000),
            "app.maza-server {\n\tencode zstd gzip\n\treverse_proxy localhost:3000\n}\n"
        );
        assert_eq!(
            caddy_import_line(Path::new("/home/me/.autohost/caddy/sites")),
            "import /home/me/.autohost/caddy/sites/*.caddy"
        );
    }

    #[test]
    fn cloudflared_config_ends_with_404_rule() {
        let config = cloudflared_config(
            "blog",
            Path::new("/root/.cloudflared/blog.json"),
            "blog.example.com",
            "http://localhost:3000",
        );
        assert!(config.starts_with("tunnel: blog\ncredentials-file: /root/.cloudflared/blog.json\n"));
        assert!(config.contains("  - hostname: blog.example.com\n    service: http://localhost:3000\n"));
        assert!(config.ends_with("  - service: http_status:404\n"));
    }

    #[test]
    fn main_tf_search_paths_are_optional() {
        let mut plan = SplitDnsPlan {
            domain: "maza-server".into(),
            nameservers: vec!["100.112.92.90".into(), "1.1.1.1".into()],
            search_paths: vec![],
        };
        let tf = terraform_main_tf(&plan, "~> 0.21");
        assert!(tf.contains("version = \"~> 0.21\""));
        assert!(tf.contains("domain      = \"maza-server\""));
        assert!(tf.contains("nameservers = [\"100.112.92.90\", \"1.1.1.1\"]"));
        assert!(!tf.contains("tailscale_dns_search_paths"));

        plan.search_paths = vec!["maza-server".into()];
        let tf = terraform_main_tf(&plan, "~> 0.21");
        assert!(tf.contains("resource \"tailscale_dns_search_paths\" \"paths\""));
        assert!(tf.contains("search_paths = [\"maza-server\"]"));
    }

    #[test]
    fn placeholders_are_found_and_replaced() {
        let example = "APP_KEY={{APP_KEY}}\nDB_PASSWORD={{DB_PASSWORD}}\nOTHER={{APP_KEY}}\n";
        assert_eq!(placeholders(example), vec!["APP_KEY", "DB_PASSWORD"]);

        let values = BTreeMap::from([("APP_KEY".to_string(), "base64:abc".to_string())]);
        assert_eq!(
            replace_placeholders(example, &values),
            "APP_KEY=base64:abc\nDB_PASSWORD={{DB_PASSWORD}}\nOTHER=base64:abc\n"
        );
    }

    #[test]
    fn workflow_targets_branch() {
        let workflow = deploy_workflow("release");
        assert!(workflow.contains("branches: [ \"release\" ]"));
        assert!(workflow.contains("runs-on: self-hosted"));
    }
}
