mod inventory;

pub use inventory::Inventory;

use std::env;

/// Config holds all application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub nautobot_url: String,
    pub nautobot_token: String,
    pub backup_repo_path: String,
    pub backup_remote_url: Option<String>,
    pub commit_message_prefix: String,
    pub fetch_method: String,
    pub inventory_file: String,
    pub cli_command: Option<String>,
    pub netconf_port: u16,
    pub ssh_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let get_opt = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            nautobot_url: get("NAUTOBOT_URL", "http://localhost:8080"),
            nautobot_token: get("NAUTOBOT_TOKEN", ""),
            backup_repo_path: get("BACKUP_REPO_PATH", "/mnt/backup"),
            backup_remote_url: get_opt("BACKUP_REMOTE_URL"),
            commit_message_prefix: get("COMMIT_MESSAGE_PREFIX", "Backup update"),
            fetch_method: get("FETCH_METHOD", "cli"),
            inventory_file: get("INVENTORY_FILE", "inventory.json"),
            cli_command: get_opt("CLI_COMMAND"),
            netconf_port: get("NETCONF_PORT", "830").parse().unwrap_or(830),
            ssh_timeout_secs: get("SSH_TIMEOUT_SECS", "30")
                .parse()
                .ok()
                .filter(|secs| *secs > 0)
                .unwrap_or(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let cfg = Config::from_lookup(|_| None);
        assert_eq!(cfg.fetch_method, "cli");
        assert_eq!(cfg.commit_message_prefix, "Backup update");
        assert_eq!(cfg.netconf_port, 830);
        assert_eq!(cfg.ssh_timeout_secs, 30);
        assert!(cfg.backup_remote_url.is_none());
        assert!(cfg.cli_command.is_none());
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let vars: HashMap<&str, &str> = [
            ("NAUTOBOT_URL", "http://nautobot.lab:8001"),
            ("FETCH_METHOD", "netconf"),
            ("NETCONF_PORT", "not-a-port"),
            ("SSH_TIMEOUT_SECS", "5"),
            ("BACKUP_REMOTE_URL", "  "),
            ("CLI_COMMAND", "show startup-config"),
        ]
        .into_iter()
        .collect();

        let cfg = Config::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.nautobot_url, "http://nautobot.lab:8001");
        assert_eq!(cfg.fetch_method, "netconf");
        assert_eq!(cfg.netconf_port, 830);
        assert_eq!(cfg.ssh_timeout_secs, 5);
        assert!(cfg.backup_remote_url.is_none());
        assert_eq!(cfg.cli_command.as_deref(), Some("show startup-config"));
    }

    #[test]
    fn test_zero_ssh_timeout_falls_back() {
        let cfg = Config::from_lookup(|k| (k == "SSH_TIMEOUT_SECS").then(|| "0".to_string()));
        assert_eq!(cfg.ssh_timeout_secs, 30);
    }
}
