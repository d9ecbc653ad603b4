use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// User configuration stored at `<root>/config/autohost.toml`.
///
/// Every field has a default, so a missing or partial file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
pub struct AutohostConfig {
    #[serde(default)]
    pub coredns: CoreDnsConfig,
    #[serde(default)]
    pub caddy: CaddyConfig,
    #[serde(default)]
    pub tailscale: TailscaleConfig,
    #[serde(default)]
    pub terraform: TerraformConfig,
    #[serde(default)]
    pub installers: InstallerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CoreDnsConfig {
    /// Name of the container serving the Corefile.
    #[serde(default = "default_container_name")]
    pub container_name: String,

    #[serde(default = "default_coredns_image")]
    pub image: String,
}

impl Default for CoreDnsConfig {
    fn default() -> Self {
        Self {
            container_name: default_container_name(),
            image: default_coredns_image(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CaddyConfig {
    /// System Caddyfile that receives the `import` line for generated sites.
    #[serde(default = "default_caddy_master_file")]
    pub master_file: String,
}

impl Default for CaddyConfig {
    fn default() -> Self {
        Self {
            master_file: default_caddy_master_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TailscaleConfig {
    /// Environment variable holding the API key used by the Terraform provider.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Tailnet used when neither `--tailnet` nor `TAILSCALE_TAILNET` is set.
    /// `-` selects the tailnet the API key belongs to.
    #[serde(default = "default_tailnet")]
    pub default_tailnet: String,
}

impl Default for TailscaleConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            default_tailnet: default_tailnet(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TerraformConfig {
    /// Version downloaded when no `terraform` binary is available.
    #[serde(default = "default_terraform_version")]
    pub version: String,

    /// Version constraint for the `tailscale/tailscale` provider.
    #[serde(default = "default_provider_version")]
    pub provider_version: String,

    #[serde(default = "default_download_base")]
    pub download_base: String,
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            version: default_terraform_version(),
            provider_version: default_provider_version(),
            download_base: default_download_base(),
        }
    }
}

/// Download locations of the third-party installers.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct InstallerConfig {
    #[serde(default = "default_docker_script")]
    pub docker_script: String,
    #[serde(default = "default_tailscale_script")]
    pub tailscale_script: String,
    #[serde(default = "default_cloudflared_binary")]
    pub cloudflared_binary: String,
    #[serde(default = "default_caddy_repo")]
    pub caddy_repo: String,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            docker_script: default_docker_script(),
            tailscale_script: default_tailscale_script(),
            cloudflared_binary: default_cloudflared_binary(),
            caddy_repo: default_caddy_repo(),
        }
    }
}

fn default_container_name() -> String {
    "coredns-autohost".to_string()
}

fn default_coredns_image() -> String {
    "coredns/coredns:latest".to_string()
}

fn default_caddy_master_file() -> String {
    "/etc/caddy/Caddyfile".to_string()
}

fn default_api_key_env() -> String {
    "TAILSCALE_API_KEY".to_string()
}

fn default_tailnet() -> String {
    "-".to_string()
}

fn default_terraform_version() -> String {
    "1.9.8".to_string()
}

fn default_provider_version() -> String {
    "~> 0.21".to_string()
}

fn default_download_base() -> String {
    "https://releases.hashicorp.com/terraform".to_string()
}

fn default_docker_script() -> String {
    "https://get.docker.com".to_string()
}

fn default_tailscale_script() -> String {
    "https://tailscale.com/install.sh".to_string()
}

fn default_cloudflared_binary() -> String {
    "https://github.com/cloudflare/cloudflared/releases/latest/download/cloudflared-linux-amd64"
        .to_string()
}

fn default_caddy_repo() -> String {
    "https://dl.cloudsmith.io/public/caddy/stable".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config: AutohostConfig =
            serde_yaml::from_str("coredns:\n  image: coredns/coredns:1.11.1\n").unwrap();
        assert_eq!(config.coredns.image, "coredns/coredns:1.11.1");
        assert_eq!(config.coredns.container_name, "coredns-autohost");
        assert_eq!(config.terraform, TerraformConfig::default());
    }

    #[test]
    fn defaults_match_provisioned_layout() {
        let config = AutohostConfig::default();
        assert_eq!(config.caddy.master_file, "/etc/caddy/Caddyfile");
        assert_eq!(config.tailscale.api_key_env, "TAILSCALE_API_KEY");
        assert_eq!(config.tailscale.default_tailnet, "-");
        assert_eq!(config.terraform.version, "1.9.8");
    }
}
