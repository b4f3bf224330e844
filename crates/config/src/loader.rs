use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::ReceptionistConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "receptionist.toml",
    "receptionist.yaml",
    "receptionist.yml",
    "receptionist.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<ReceptionistConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&substitute_env(&raw), path)
}

/// Discover, load and env-override the config.
///
/// Search order:
/// 1. `config_dir` when given, otherwise `./receptionist.{toml,yaml,yml,json}`
/// 2. the user config directory (e.g. `~/.config/receptionist/`)
///
/// Falls back to `ReceptionistConfig::default()` when nothing is found or the
/// file fails to parse. Process env overrides are applied last.
pub fn discover_and_load(config_dir: Option<&Path>) -> ReceptionistConfig {
    let mut config = match find_config_file(config_dir) {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                ReceptionistConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            ReceptionistConfig::default()
        },
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    config
}

/// Find the first config file, honouring an explicit directory override.
pub fn find_config_file(config_dir_override: Option<&Path>) -> Option<PathBuf> {
    let candidates_in = |dir: &Path| {
        CONFIG_FILENAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.exists())
    };

    if let Some(dir) = config_dir_override {
        return candidates_in(dir);
    }

    candidates_in(Path::new(".")).or_else(|| config_dir().and_then(|dir| candidates_in(&dir)))
}

/// Returns the user-global config directory (`~/.config/receptionist/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "receptionist").map(|d| d.config_dir().to_path_buf())
}

/// Apply environment overrides on top of a loaded config.
///
/// Besides `RECEPTIONIST_*` names this understands the variable names the
/// deployment already exports (`PORT`, `GOOGLE_API_KEY`, `TWILIO_*`).
pub fn apply_env_overrides(
    config: &mut ReceptionistConfig,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(bind) = get("RECEPTIONIST_BIND") {
        config.server.bind = bind;
    }
    if let Some(port) = get("RECEPTIONIST_PORT").or_else(|| get("PORT")) {
        match port.trim().parse() {
            Ok(port) => config.server.port = port,
            Err(_) => warn!(value = %port, "ignoring invalid port override"),
        }
    }
    if let Some(key) = get("GOOGLE_API_KEY") {
        config.llm.api_key = Secret::new(key);
    }
    if let Some(sid) = get("TWILIO_ACCOUNT_SID") {
        config.whatsapp.account_sid = sid;
    }
    if let Some(token) = get("TWILIO_AUTH_TOKEN") {
        config.whatsapp.auth_token = Secret::new(token);
    }
    if let Some(number) = get("TWILIO_WHATSAPP_NUMBER") {
        config.whatsapp.from_number = number;
    }
    if let Some(username) = get("DIRECTORY_USERNAME") {
        config.directory.username = username;
    }
    if let Some(password) = get("DIRECTORY_PASSWORD") {
        config.directory.password = Secret::new(password);
    }
}

fn parse_config(raw: &str, path: &Path) -> Result<ReceptionistConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        other => Err(Error::UnsupportedFormat {
            extension: other.to_string(),
        }),
    }
}
