//! Runtime settings and the secret lookup chain.
//!
//! Lookup order for `get(section, key)`:
//! 1. Doppler (`SECTION_KEY` injected by `doppler run`, then the downloaded bundle)
//! 2. AWS Secrets Manager secret `{aws_secret_name}/{section}` (JSON object)
//! 3. HashiCorp Vault KV v2 at `{vault_path}/{section}`
//! 4. Environment / `.env`: `KEY`, then `SECTION_KEY`
//!
//! Values starting with `YOUR_` are template placeholders and never returned.

use crate::consts::endpoints;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Sections prefetched from AWS and Vault at startup.
const SECTIONS: &[&str] = &["discord", "news", "xkcd", "comic", "solar", "events"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("DISCORD_BOT_TOKEN is not configured")]
    MissingToken,
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),
    #[error("AWS Secrets Manager: {0}")]
    Aws(String),
    #[error("Unexpected secret store payload: {0}")]
    Payload(String),
}

fn usable(value: &str) -> bool {
    if value.starts_with("YOUR_") {
        log::warn!("Ignoring placeholder secret value ({}...)", &value[..5]);
        return false;
    }
    !value.trim().is_empty()
}

pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on" | "enabled"
    )
}

#[derive(Debug, Default, Clone)]
pub struct Secrets {
    env: HashMap<String, String>,
    doppler_enabled: bool,
    doppler: HashMap<String, String>,
    aws: HashMap<String, HashMap<String, String>>,
    vault: HashMap<String, HashMap<String, String>>,
}

impl Secrets {
    /// Snapshot the process environment and pull remote stores once.
    pub async fn load(client: &Client) -> Self {
        let env: HashMap<String, String> = std::env::vars().collect();
        let mut secrets = Self::from_env(env);

        if secrets.doppler_enabled {
            match fetch_doppler(client, &secrets.env, endpoints::DOPPLER_DOWNLOAD).await {
                Ok(bundle) => {
                    log::info!("Doppler: {} secrets available", bundle.len());
                    secrets.doppler = bundle;
                }
                Err(e) => log::warn!("Doppler download failed, relying on injected env: {}", e),
            }
        }

        if secrets.env_flag("SECRETS_AWS_ENABLED") {
            let name = secrets
                .env
                .get("SECRETS_AWS_SECRET_NAME")
                .cloned()
                .unwrap_or_else(|| "penguin-overlord".to_string());
            let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            let aws = aws_sdk_secretsmanager::Client::new(&sdk_config);
            for section in SECTIONS {
                match fetch_aws(&aws, &name, section).await {
                    Ok(data) => {
                        secrets.aws.insert((*section).to_string(), data);
                    }
                    Err(e) => log::debug!("AWS lookup for {}/{} failed: {}", name, section, e),
                }
            }
        }

        if secrets.env_flag("SECRETS_VAULT_ENABLED") {
            match VaultSettings::from_env(&secrets.env) {
                Some(vault) => {
                    for section in SECTIONS {
                        match vault.read(client, section).await {
                            Ok(data) => {
                                secrets.vault.insert((*section).to_string(), data);
                            }
                            Err(e) => log::debug!("Vault lookup for {} failed: {}", section, e),
                        }
                    }
                }
                None => log::warn!("SECRETS_VAULT_ENABLED set but SECRETS_VAULT_URL/TOKEN missing"),
            }
        }
        secrets
    }

    pub fn from_env(env: HashMap<String, String>) -> Self {
        let doppler_enabled = env.get("DOPPLER_TOKEN").is_some_and(|t| !t.is_empty());
        Self { env, doppler_enabled, ..Default::default() }
    }

    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        let simple = key.to_uppercase();
        let sectioned = format!("{}_{}", section, key).to_uppercase();

        if self.doppler_enabled {
            let hit = [self.env.get(&sectioned), self.doppler.get(&sectioned), self.doppler.get(&simple)]
                .into_iter()
                .flatten()
                .find(|v| usable(v));
            if let Some(v) = hit {
                log::debug!("Secret {}.{} from Doppler", section, key);
                return Some(v.clone());
            }
        }

        for (store, sections) in [("AWS Secrets Manager", &self.aws), ("Vault", &self.vault)] {
            let Some(data) = sections.get(&section.to_lowercase()) else { continue };
            let hit = [data.get(key), data.get(&simple), data.get(&sectioned)]
                .into_iter()
                .flatten()
                .find(|v| usable(v));
            if let Some(v) = hit {
                log::debug!("Secret {}.{} from {}", section, key, store);
                return Some(v.clone());
            }
        }

        [self.env.get(&simple), self.env.get(&sectioned)]
            .into_iter()
            .flatten()
            .find(|v| usable(v))
            .cloned()
    }

    pub fn get_u64(&self, section: &str, key: &str) -> Option<u64> {
        let raw = self.get(section, key)?;
        match raw.trim().parse() {
            Ok(v) => Some(v),
            Err(_) => {
                log::warn!("Invalid integer for {}.{}: {}", section, key, raw);
                None
            }
        }
    }

    fn env_flag(&self, name: &str) -> bool {
        self.env.get(name).is_some_and(|v| parse_bool(v))
    }

    #[cfg(test)]
    fn with_doppler(mut self, bundle: HashMap<String, String>) -> Self {
        self.doppler_enabled = true;
        self.doppler = bundle;
        self
    }
}

async fn fetch_doppler(
    client: &Client,
    env: &HashMap<String, String>,
    url: &str,
) -> Result<HashMap<String, String>, ConfigError> {
    let token = env.get("DOPPLER_TOKEN").cloned().unwrap_or_default();
    let mut query = vec![("format", "json".to_string())];
    if let Some(project) = env.get("DOPPLER_PROJECT") {
        query.push(("project", project.clone()));
    }
    if let Some(config) = env.get("DOPPLER_CONFIG") {
        query.push(("config", config.clone()));
    }
    let body: Value = client
        .get(url)
        .bearer_auth(token)
        .query(&query)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    string_map(&body).ok_or_else(|| ConfigError::Payload("expected a JSON object".into()))
}

async fn fetch_aws(
    client: &aws_sdk_secretsmanager::Client,
    name: &str,
    section: &str,
) -> Result<HashMap<String, String>, ConfigError> {
    let output = client
        .get_secret_value()
        .secret_id(format!("{}/{}", name, section))
        .send()
        .await
        .map_err(|e| ConfigError::Aws(aws_sdk_secretsmanager::error::DisplayErrorContext(e).to_string()))?;
    let raw = output
        .secret_string()
        .ok_or_else(|| ConfigError::Payload("secret has no SecretString".into()))?;
    parse_secret_string(raw)
}

/// `SecretString` holds a flat JSON object of string values.
fn parse_secret_string(raw: &str) -> Result<HashMap<String, String>, ConfigError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| ConfigError::Payload(e.to_string()))?;
    string_map(&value).ok_or_else(|| ConfigError::Payload("expected a JSON object".into()))
}

fn string_map(value: &Value) -> Option<HashMap<String, String>> {
    let object = value.as_object()?;
    Some(
        object
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect(),
    )
}

struct VaultSettings {
    url: String,
    token: String,
    mount: String,
    path: String,
}

impl VaultSettings {
    fn from_env(env: &HashMap<String, String>) -> Option<Self> {
        let url = env.get("SECRETS_VAULT_URL")?.trim_end_matches('/').to_string();
        let token = env.get("SECRETS_VAULT_TOKEN")?.clone();
        let full = env
            .get("SECRETS_VAULT_PATH")
            .cloned()
            .unwrap_or_else(|| "secret/penguin-overlord".to_string());
        let (mount, path) = full.trim_matches('/').split_once('/').unwrap_or(("secret", "penguin-overlord"));
        Some(Self { url, token, mount: mount.to_string(), path: path.to_string() })
    }

    async fn read(&self, client: &Client, section: &str) -> Result<HashMap<String, String>, ConfigError> {
        let url = format!("{}/v1/{}/data/{}/{}", self.url, self.mount, self.path, section);
        let body: Value = client
            .get(url)
            .header("X-Vault-Token", &self.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        string_map(&body["data"]["data"]).ok_or_else(|| ConfigError::Payload("missing data.data".into()))
    }
}

/// Everything the bot and the one-shot runners need at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub token: String,
    pub owner_id: Option<u64>,
    pub data_dir: PathBuf,
    pub events_dir: PathBuf,
    pub xkcd_poll_minutes: u64,
    pub xkcd_channel: Option<u64>,
    pub comic_channel: Option<u64>,
    pub solar_channel: Option<u64>,
    pub events_reminder_channel: Option<u64>,
}

impl Settings {
    pub fn resolve(secrets: &Secrets, data_dir: PathBuf, events_dir: PathBuf) -> Result<Self, ConfigError> {
        let token = secrets
            .get("DISCORD", "BOT_TOKEN")
            .or_else(|| secrets.get("DISCORD", "TOKEN"))
            .ok_or(ConfigError::MissingToken)?;

        Ok(Self {
            token,
            owner_id: secrets.get_u64("DISCORD", "OWNER_ID"),
            data_dir,
            events_dir,
            xkcd_poll_minutes: secrets.get_u64("XKCD", "POLL_INTERVAL_MINUTES").unwrap_or(30).max(1),
            xkcd_channel: secrets.get_u64("XKCD", "POST_CHANNEL_ID"),
            comic_channel: secrets.get_u64("COMIC", "POST_CHANNEL_ID"),
            solar_channel: secrets.get_u64("SOLAR", "POST_CHANNEL_ID"),
            events_reminder_channel: secrets.get_u64("EVENTS", "REMINDER_CHANNEL_ID"),
        })
    }

    pub fn data_file(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{client, serve, Canned};
    use std::sync::Arc;
    use std::time::Duration;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn simple_key_wins_over_sectioned_in_env() {
        let s = Secrets::from_env(env(&[("BOT_TOKEN", "a"), ("DISCORD_BOT_TOKEN", "b")]));
        assert_eq!(s.get("DISCORD", "BOT_TOKEN").as_deref(), Some("a"));
    }

    #[test]
    fn placeholders_are_skipped() {
        let s = Secrets::from_env(env(&[("BOT_TOKEN", "YOUR_TOKEN_HERE"), ("DISCORD_BOT_TOKEN", "real")]));
        assert_eq!(s.get("DISCORD", "BOT_TOKEN").as_deref(), Some("real"));
        let s = Secrets::from_env(env(&[("DISCORD_BOT_TOKEN", "YOUR_TOKEN")]));
        assert!(s.get("DISCORD", "BOT_TOKEN").is_none());
    }

    #[test]
    fn doppler_outranks_environment() {
        let s = Secrets::from_env(env(&[("BOT_TOKEN", "from-env")]))
            .with_doppler(env(&[("DISCORD_BOT_TOKEN", "from-doppler")]));
        assert_eq!(s.get("DISCORD", "BOT_TOKEN").as_deref(), Some("from-doppler"));
    }

    #[test]
    fn vault_outranks_environment() {
        let mut s = Secrets::from_env(env(&[("NEWS_TECH_CHANNEL_ID", "1")]));
        s.vault.insert("news".into(), env(&[("TECH_CHANNEL_ID", "2")]));
        assert_eq!(s.get_u64("NEWS", "TECH_CHANNEL_ID"), Some(2));
    }

    #[test]
    fn aws_sits_between_doppler_and_vault() {
        let mut s = Secrets::from_env(env(&[("TECH_CHANNEL_ID", "1")]));
        s.vault.insert("news".into(), env(&[("TECH_CHANNEL_ID", "2")]));
        s.aws.insert("news".into(), parse_secret_string(r#"{"tech_channel_id":"3"}"#).unwrap());
        assert_eq!(s.get_u64("NEWS", "tech_channel_id"), Some(3));

        s.aws.insert("news".into(), parse_secret_string(r#"{"TECH_CHANNEL_ID":"YOUR_CHANNEL"}"#).unwrap());
        assert_eq!(s.get_u64("NEWS", "TECH_CHANNEL_ID"), Some(2), "placeholder falls through to Vault");

        let s = s.with_doppler(env(&[("NEWS_TECH_CHANNEL_ID", "4")]));
        assert_eq!(s.get_u64("NEWS", "TECH_CHANNEL_ID"), Some(4));
    }

    #[test]
    fn aws_secret_string_must_be_an_object() {
        let data = parse_secret_string(r#"{"BOT_TOKEN":"t","PORT":8080}"#).unwrap();
        assert_eq!(data.get("BOT_TOKEN").map(String::as_str), Some("t"));
        assert!(!data.contains_key("PORT"));
        assert!(matches!(parse_secret_string("[1,2]"), Err(ConfigError::Payload(_))));
        assert!(matches!(parse_secret_string("not json"), Err(ConfigError::Payload(_))));
    }

    #[test]
    fn settings_require_a_token() {
        let s = Secrets::from_env(env(&[("DISCORD_OWNER_ID", "77")]));
        assert!(matches!(
            Settings::resolve(&s, "data".into(), "events".into()),
            Err(ConfigError::MissingToken)
        ));

        let s = Secrets::from_env(env(&[("DISCORD_TOKEN", "t"), ("DISCORD_OWNER_ID", "77"), ("XKCD_POLL_INTERVAL_MINUTES", "junk")]));
        let settings = Settings::resolve(&s, "data".into(), "events".into()).unwrap();
        assert_eq!(settings.token, "t");
        assert_eq!(settings.owner_id, Some(77));
        assert_eq!(settings.xkcd_poll_minutes, 30);
    }

    #[test]
    fn bool_parsing() {
        for v in ["true", "1", "YES", "on", "enabled"] {
            assert!(parse_bool(v), "{v}");
        }
        assert!(!parse_bool("nope"));
    }

    #[tokio::test]
    async fn reads_vault_kv_v2_layout() {
        let server = serve(
            Duration::ZERO,
            Arc::new(|req: &str| {
                if req.starts_with("GET /v1/secret/data/penguin/discord ") && req.to_lowercase().contains("x-vault-token: tok") {
                    Canned::ok(r#"{"data":{"data":{"BOT_TOKEN":"vaulted"},"metadata":{}}}"#)
                } else {
                    Canned::status(403)
                }
            }),
        )
        .await;
        let vault = VaultSettings::from_env(&env(&[
            ("SECRETS_VAULT_URL", server.base.as_str()),
            ("SECRETS_VAULT_TOKEN", "tok"),
            ("SECRETS_VAULT_PATH", "secret/penguin"),
        ]))
        .unwrap();
        let data = vault.read(&client(), "discord").await.unwrap();
        assert_eq!(data["BOT_TOKEN"], "vaulted");
        assert!(vault.read(&client(), "news").await.is_err());
    }

    #[tokio::test]
    async fn downloads_doppler_bundle() {
        let server = serve(
            Duration::ZERO,
            Arc::new(|req: &str| {
                if req.to_lowercase().contains("authorization: bearer dp.st.x") && req.contains("format=json") {
                    Canned::ok(r#"{"DISCORD_BOT_TOKEN":"abc","COUNT":3}"#)
                } else {
                    Canned::status(401)
                }
            }),
        )
        .await;
        let bundle = fetch_doppler(&client(), &env(&[("DOPPLER_TOKEN", "dp.st.x")]), &server.url("/download"))
            .await
            .unwrap();
        assert_eq!(bundle.get("DISCORD_BOT_TOKEN").map(String::as_str), Some("abc"));
        assert!(!bundle.contains_key("COUNT"));
    }
}
