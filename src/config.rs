use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use crate::session::Credentials;

const URL_VAR: &str = "METABASE_URL";
const USERNAME_VAR: &str = "METABASE_USERNAME";
const PASSWORD_VAR: &str = "METABASE_PASSWORD";
const RC_VAR: &str = "METABASE_RC";
const RC_FILE: &str = ".metabaserc";

const RC_KEYS: [&str; 4] = ["url", "username", "password", "verify"];

/// Fully resolved connection settings.
#[derive(Debug)]
pub struct ClientConfig {
    /// Metabase endpoint, either a bare host or an `http(s)://` URL.
    pub url: String,
    pub credentials: Credentials,
    /// Whether to verify TLS certificates.
    pub verify: bool,
}

/// Values given explicitly, usually from the command line.
/// They win over the environment and the rc file.
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub verify: Option<bool>,
}

#[derive(Debug, Default, PartialEq)]
struct RcConfig {
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    verify: Option<bool>,
}

/// Resolves settings from (in order of precedence):
/// - explicit `overrides`
/// - environment variables `METABASE_URL` / `METABASE_USERNAME` / `METABASE_PASSWORD`
/// - config file from `METABASE_RC` or `.metabaserc`
pub fn load_config(overrides: ConfigOverrides) -> crate::Result<ClientConfig> {
    Ok(resolve(
        overrides,
        |name| std::env::var(name).ok(),
        &rc_candidates(),
    )?)
}

fn resolve<F>(overrides: ConfigOverrides, env: F, rc_candidates: &[PathBuf]) -> Result<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut url = overrides.url.or_else(|| env(URL_VAR));
    let mut username = overrides.username.or_else(|| env(USERNAME_VAR));
    let mut password = overrides.password.or_else(|| env(PASSWORD_VAR));

    let mut file_verify: Option<bool> = None;

    if url.is_none() || username.is_none() || password.is_none() || overrides.verify.is_none() {
        for rc_path in rc_candidates {
            if rc_path.exists() {
                let cfg = read_rc(rc_path).with_context(|| {
                    format!("failed to read configuration file {}", rc_path.display())
                })?;

                url = url.or(cfg.url);
                username = username.or(cfg.username);
                password = password.or(cfg.password);
                file_verify = cfg.verify;
                break;
            }
        }
    }

    let url = require(url, "url", "--metabase-url", URL_VAR, rc_candidates)?;
    let username = require(username, "username", "--username", USERNAME_VAR, rc_candidates)?;
    let password = require(password, "password", "--password", PASSWORD_VAR, rc_candidates)?;

    let verify = overrides.verify.or(file_verify).unwrap_or(true);

    Ok(ClientConfig {
        url,
        credentials: Credentials::new(username, password),
        verify,
    })
}

fn require(
    value: Option<String>,
    key: &str,
    flag: &str,
    var: &str,
    rc_candidates: &[PathBuf],
) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None if rc_candidates.is_empty() => {
            bail!("Missing configuration: {key} (pass {flag}, set {var} or create {RC_FILE})")
        }
        None => bail!(
            "Missing configuration: {key} (pass {flag}, set {var} or put `{key}:` in one of: {})",
            rc_candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_rc(&text))
}

fn parse_rc(text: &str) -> RcConfig {
    let mut cfg = RcConfig::default();

    // A key may have its value on the following line.
    let mut pending_key: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let entry = split_entry(line);

        if let Some(pk) = pending_key.take() {
            if entry.is_none() {
                cfg.set(pk, strip_quotes(line));
                continue;
            }
        }

        if let Some((k, v)) = entry {
            let v = strip_quotes(v);
            if v.is_empty() {
                pending_key = Some(k);
            } else {
                cfg.set(k, v);
            }
        }
    }

    cfg
}

impl RcConfig {
    fn set(&mut self, key: &str, value: &str) {
        match key {
            "url" => self.url = Some(value.to_string()),
            "username" => self.username = Some(value.to_string()),
            "password" => self.password = Some(value.to_string()),
            "verify" => self.verify = Some(value != "0"),
            _ => {}
        }
    }
}

// `url: http://host:3000` splits on the first colon only; a line whose
// prefix is not a known key is not an entry.
fn split_entry(line: &str) -> Option<(&str, &str)> {
    let (k, v) = line.split_once(':')?;
    let k = k.trim();
    RC_KEYS.contains(&k).then(|| (k, v.trim()))
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

fn rc_candidates() -> Vec<PathBuf> {
    // 1) METABASE_RC (explicit)
    // 2) ./.metabaserc
    // 3) ~/.metabaserc
    if let Ok(p) = std::env::var(RC_VAR) {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(RC_FILE));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(RC_FILE));
    }
    v
}
