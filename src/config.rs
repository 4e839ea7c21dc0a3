use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const DEFAULT_HOST: &str = "http://nomenklatura.okfnlabs.org";
pub const DEFAULT_API_PREFIX: &str = "/api/2/";

pub const HOST_ENV: &str = "NOMENKLATURA_HOST";
pub const API_KEY_ENV: &str = "NOMENKLATURA_APIKEY";
pub const CONFIG_ENV: &str = "NOMENKLATURA_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server root, e.g. `http://nomenklatura.okfnlabs.org`.
    pub host: String,
    /// Sent verbatim as the `Authorization` header when present.
    pub api_key: Option<String>,
    /// Path between the host and every endpoint, `/api/2/` by default.
    pub api_prefix: String,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            api_key: None,
            api_prefix: DEFAULT_API_PREFIX.to_string(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_prefix(mut self, api_prefix: impl Into<String>) -> Self {
        self.api_prefix = api_prefix.into();
        self
    }

    /// Host and prefix joined with exactly one slash between them.
    pub fn base_url(&self) -> String {
        if self.host.ends_with('/') && self.api_prefix.starts_with('/') {
            format!("{}{}", self.host, &self.api_prefix[1..])
        } else {
            format!("{}{}", self.host, self.api_prefix)
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST)
    }
}

/// The `[client]` section of the user's config file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct IniConfig {
    pub(crate) host: Option<String>,
    pub(crate) api_key: Option<String>,
}

/// Resolves host and API key, in order of precedence:
/// - explicit `host`/`api_key` arguments
/// - environment variables `NOMENKLATURA_HOST` / `NOMENKLATURA_APIKEY`
/// - the `[client]` section of `NOMENKLATURA_CONFIG` or `~/.nomenklatura.ini`
/// - the public nomenklatura host (there is no default API key)
pub fn load_config(host: Option<String>, api_key: Option<String>) -> Result<ClientConfig> {
    load_config_with(host, api_key, |name| std::env::var(name).ok())
}

pub(crate) fn load_config_with<F>(
    host: Option<String>,
    api_key: Option<String>,
    env: F,
) -> Result<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    // The file is only consulted when something is still unresolved.
    let needs_file = non_empty(host.clone())
        .or_else(|| non_empty(env(HOST_ENV)))
        .is_none()
        || non_empty(api_key.clone())
            .or_else(|| non_empty(env(API_KEY_ENV)))
            .is_none();

    let mut ini = None;
    if needs_file {
        if let Some(path) = config_path(env(CONFIG_ENV)) {
            if path.exists() {
                ini = Some(read_ini(&path).map_err(|e| {
                    Error::Config(format!(
                        "failed to read configuration file {}: {}",
                        path.display(),
                        e
                    ))
                })?);
            }
        }
    }

    Ok(resolve(host, api_key, env, ini.as_ref()))
}

pub(crate) fn resolve<F>(
    host: Option<String>,
    api_key: Option<String>,
    env: F,
    ini: Option<&IniConfig>,
) -> ClientConfig
where
    F: Fn(&str) -> Option<String>,
{
    let ini_host = ini.and_then(|c| c.host.clone());
    let ini_key = ini.and_then(|c| c.api_key.clone());

    let host = non_empty(host)
        .or_else(|| non_empty(env(HOST_ENV)))
        .or_else(|| non_empty(ini_host))
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let api_key = non_empty(api_key)
        .or_else(|| non_empty(env(API_KEY_ENV)))
        .or_else(|| non_empty(ini_key));

    ClientConfig {
        host,
        api_key,
        api_prefix: DEFAULT_API_PREFIX.to_string(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn config_path(explicit: Option<String>) -> Option<PathBuf> {
    if let Some(p) = non_empty(explicit) {
        return Some(PathBuf::from(p));
    }
    dirs::home_dir().map(|home| home.join(".nomenklatura.ini"))
}

pub(crate) fn read_ini(path: &Path) -> std::io::Result<IniConfig> {
    Ok(parse_ini(&std::fs::read_to_string(path)?))
}

/// Reads `host` and `api_key` from the `[client]` section. Other sections
/// and keys are ignored.
pub(crate) fn parse_ini(text: &str) -> IniConfig {
    let mut cfg = IniConfig::default();
    let mut in_client = false;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            in_client = line[1..line.len() - 1].trim().eq_ignore_ascii_case("client");
            continue;
        }
        if !in_client {
            continue;
        }

        let Some(idx) = line.find(['=', ':']) else {
            continue;
        };
        let k = line[..idx].trim().to_ascii_lowercase();
        let v = strip_quotes(&line[idx + 1..]);
        match k.as_str() {
            "host" => cfg.host = Some(v.to_string()),
            "api_key" => cfg.api_key = Some(v.to_string()),
            _ => {}
        }
    }

    cfg
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}
