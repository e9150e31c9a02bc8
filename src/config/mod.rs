// Configuration module entry point
// Loads the server settings and the list of asset mounts

mod mount;
mod types;

use std::net::SocketAddr;

pub use mount::{ConfigError, MountConfig};
pub use types::{AssetsConfig, Config, LoggingConfig, OverrideEntry, ServerConfig};

/// Prefix for environment overrides, e.g. `ASSETS_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "ASSETS";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        Self::load_with_env(config_path, environment())
    }

    fn load_with_env(config_path: &str, env: config::Environment) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(env)
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

/// `ASSETS_` then `__` between nested keys
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn load(contents: &str) -> Config {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("assets.toml");
        fs::write(&path, contents).unwrap();
        Config::load_from(path.to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_defaults_without_file() {
        let config = Config::load_from("/nonexistent/asset-mount-config").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.timeout_secs, 30);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.access_log_format, "combined");
        assert!(config.mounts.is_empty());
        assert_eq!(config.get_socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_mount_tables() {
        let config = load(
            r#"
[server]
port = 9090

[[mounts]]
uri_path = "/js/*"
resource_path = "/assets/js"
cache_spec = "maximumWeight=1000000,expireAfterWrite=10m"
cache_control_header = "public, max-age=60"

[mounts.mime_types]
mjs = "text/javascript"

[[mounts.overrides]]
url = "/js/app.js"
path = "/home/dev/app.js"

[[mounts.overrides]]
url = "/js/vendor"
path = "/home/dev/vendor"

[[mounts]]
uri_path = "/css"
file_path = "/srv/css/"
index_file = ""
"#,
        );
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.mounts.len(), 2);

        let js = &config.mounts[0];
        assert_eq!(js.uri_path, "/js/*");
        assert_eq!(js.resource_path, "/assets/js");
        assert_eq!(js.index_file, "index.htm");
        assert_eq!(js.mime_types.get("mjs").map(String::as_str), Some("text/javascript"));
        assert_eq!(js.overrides.len(), 2);
        assert_eq!(js.overrides[1].url, "/js/vendor");
        assert_eq!(js.cache_control_header.as_deref(), Some("public, max-age=60"));

        let css = &config.mounts[1];
        assert_eq!(css.resource_path, "/assets");
        assert_eq!(css.file_path.as_deref(), Some("/srv/css/"));
        assert_eq!(css.cache_spec, "maximumSize=100");

        let mount = css.build_mount(None).unwrap();
        assert_eq!(mount.uri_prefix, "/css");
        assert!(mount.cache_policy.is_disabled());
        assert_eq!(mount.index_file, None);
    }

    #[test]
    fn test_environment_overrides() {
        let vars = HashMap::from([
            ("ASSETS_SERVER__PORT".to_string(), "9123".to_string()),
            ("ASSETS_LOGGING__LEVEL".to_string(), "debug".to_string()),
            ("OTHER_SERVER__PORT".to_string(), "1".to_string()),
        ]);
        let env = environment().source(Some(vars));
        let config = Config::load_with_env("/nonexistent/asset-mount-config", env).unwrap();
        assert_eq!(config.server.port, 9123);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_bad_address() {
        let mut config = load("[server]\nhost = \"not an ip\"\n");
        assert!(config.get_socket_addr().is_err());
        config.server.host = "0.0.0.0".to_string();
        assert!(config.get_socket_addr().is_ok());
    }
}
