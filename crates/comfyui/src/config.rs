use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::workflow::ArtifactKind;

/// Connection and polling settings for a [`MediaJobClient`](crate::media_client::MediaJobClient).
///
/// All fields have defaults suitable for a ComfyUI instance running on
/// the same machine. Override via environment variables with
/// [`from_env`](Self::from_env).
#[derive(Debug, Clone)]
pub struct MediaClientConfig {
    /// HTTP base URL of the execution server (default: `http://127.0.0.1:8188`).
    pub server_url: String,
    /// Directory the server writes outputs into (default: `ComfyUI/output`).
    pub base_output_dir: PathBuf,
    /// Delay between output directory checks (default: 500 ms).
    pub poll_interval: Duration,
    /// How long to wait for a full image batch after the signal (default: 60 s).
    pub image_timeout: Duration,
    /// How long to wait for a video file after the signal (default: 180 s).
    pub video_timeout: Duration,
}

/// Errors raised while reading configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("{key} must be greater than 0")]
    NotPositive { key: &'static str },
}

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8188";
const DEFAULT_OUTPUT_DIR: &str = "ComfyUI/output";
const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
const DEFAULT_IMAGE_TIMEOUT_SECS: u64 = 60;
const DEFAULT_VIDEO_TIMEOUT_SECS: u64 = 180;

impl Default for MediaClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            base_output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            image_timeout: Duration::from_secs(DEFAULT_IMAGE_TIMEOUT_SECS),
            video_timeout: Duration::from_secs(DEFAULT_VIDEO_TIMEOUT_SECS),
        }
    }
}

impl MediaClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default                  |
    /// |----------------------|--------------------------|
    /// | `COMFYUI_URL`        | `http://127.0.0.1:8188`  |
    /// | `COMFYUI_HOST`       | --                       |
    /// | `COMFYUI_PORT`       | --                       |
    /// | `COMFYUI_OUTPUT_DIR` | `ComfyUI/output`         |
    /// | `POLL_INTERVAL_MS`   | `500`                    |
    /// | `IMAGE_TIMEOUT_SECS` | `60`                     |
    /// | `VIDEO_TIMEOUT_SECS` | `180`                    |
    ///
    /// `COMFYUI_URL` wins over `COMFYUI_HOST` + `COMFYUI_PORT`, which
    /// together form `http://<host>:<port>`. The plain `IP` and `PORT`
    /// keys of an `IP_PORT_ADDRESS.txt` key file are accepted as
    /// fallbacks for host and port.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = first_set(&lookup, &["COMFYUI_HOST", "IP"]);
        let port = first_set(&lookup, &["COMFYUI_PORT", "PORT"]);
        let server_url = match (lookup("COMFYUI_URL"), host, port) {
            (Some(url), _, _) => url,
            (None, Some((_, host)), Some((port_key, port))) => {
                let port: u16 = parse_value(port_key, &port)?;
                format!("http://{}:{port}", host.trim())
            }
            _ => DEFAULT_SERVER_URL.to_string(),
        };
        let server_url = server_url.trim().trim_end_matches('/').to_string();

        let base_output_dir = lookup("COMFYUI_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let poll_interval =
            Duration::from_millis(positive(&lookup, "POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?);
        let image_timeout =
            Duration::from_secs(positive(&lookup, "IMAGE_TIMEOUT_SECS", DEFAULT_IMAGE_TIMEOUT_SECS)?);
        let video_timeout =
            Duration::from_secs(positive(&lookup, "VIDEO_TIMEOUT_SECS", DEFAULT_VIDEO_TIMEOUT_SECS)?);

        Ok(Self {
            server_url,
            base_output_dir,
            poll_interval,
            image_timeout,
            video_timeout,
        })
    }

    /// WebSocket base URL derived from [`server_url`](Self::server_url).
    ///
    /// `http` becomes `ws`, `https` becomes `wss`, and a bare `host:port`
    /// is assumed to be plain `ws`.
    pub fn ws_url(&self) -> String {
        if let Some(rest) = self.server_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.server_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            format!("ws://{}", self.server_url)
        }
    }

    /// Physical directory for a caller-supplied folder name.
    pub fn output_dir(&self, folder: &str) -> PathBuf {
        self.base_output_dir.join(Path::new(folder))
    }

    /// Polling timeout for the given artifact kind.
    pub fn timeout_for(&self, kind: ArtifactKind) -> Duration {
        match kind {
            ArtifactKind::Image => self.image_timeout,
            ArtifactKind::Video => self.video_timeout,
        }
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

/// First of `keys` with a value, together with the key that supplied it.
fn first_set<F>(lookup: &F, keys: &[&'static str]) -> Option<(&'static str, String)>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter().find_map(|&key| lookup(key).map(|value| (key, value)))
}

fn positive<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = match lookup(key) {
        Some(raw) => parse_value(key, &raw)?,
        None => default,
    };
    if value == 0 {
        return Err(ConfigError::NotPositive { key });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = MediaClientConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.server_url, "http://127.0.0.1:8188");
        assert_eq!(config.base_output_dir, PathBuf::from("ComfyUI/output"));
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.image_timeout, Duration::from_secs(60));
        assert_eq!(config.video_timeout, Duration::from_secs(180));
    }

    #[test]
    fn host_and_port_build_the_url() {
        let config = MediaClientConfig::from_lookup(lookup_from(&[
            ("COMFYUI_HOST", "10.0.0.5"),
            ("COMFYUI_PORT", "8188"),
        ]))
        .unwrap();
        assert_eq!(config.server_url, "http://10.0.0.5:8188");
    }

    #[test]
    fn ip_and_port_keys_are_fallbacks() {
        let config = MediaClientConfig::from_lookup(lookup_from(&[
            ("IP", "192.168.0.20"),
            ("PORT", "8188"),
        ]))
        .unwrap();
        assert_eq!(config.server_url, "http://192.168.0.20:8188");

        let config = MediaClientConfig::from_lookup(lookup_from(&[
            ("COMFYUI_HOST", "gpu-box"),
            ("IP", "192.168.0.20"),
            ("PORT", "9000"),
        ]))
        .unwrap();
        assert_eq!(config.server_url, "http://gpu-box:9000");
    }

    #[test]
    fn bad_fallback_port_names_its_key() {
        let result = MediaClientConfig::from_lookup(lookup_from(&[("IP", "10.0.0.1"), ("PORT", "x")]));
        assert_matches!(result, Err(ConfigError::InvalidValue { key: "PORT", .. }));
    }

    #[test]
    fn explicit_url_wins_and_is_normalized() {
        let config = MediaClientConfig::from_lookup(lookup_from(&[
            ("COMFYUI_URL", "https://gpu.example.com/"),
            ("COMFYUI_HOST", "ignored"),
            ("COMFYUI_PORT", "1"),
        ]))
        .unwrap();
        assert_eq!(config.server_url, "https://gpu.example.com");
    }

    #[test]
    fn bad_port_is_reported() {
        let result = MediaClientConfig::from_lookup(lookup_from(&[
            ("COMFYUI_HOST", "localhost"),
            ("COMFYUI_PORT", "eighty"),
        ]));
        assert_matches!(result, Err(ConfigError::InvalidValue { key: "COMFYUI_PORT", .. }));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let result = MediaClientConfig::from_lookup(lookup_from(&[("VIDEO_TIMEOUT_SECS", "0")]));
        assert_matches!(result, Err(ConfigError::NotPositive { key: "VIDEO_TIMEOUT_SECS" }));
    }

    #[test]
    fn ws_url_follows_scheme() {
        let mut config = MediaClientConfig::default();
        assert_eq!(config.ws_url(), "ws://127.0.0.1:8188");

        config.server_url = "https://gpu.example.com".into();
        assert_eq!(config.ws_url(), "wss://gpu.example.com");

        config.server_url = "192.168.0.10:8188".into();
        assert_eq!(config.ws_url(), "ws://192.168.0.10:8188");
    }

    #[test]
    fn timeouts_per_kind() {
        let config = MediaClientConfig::default();
        assert_eq!(config.timeout_for(ArtifactKind::Image), Duration::from_secs(60));
        assert_eq!(config.timeout_for(ArtifactKind::Video), Duration::from_secs(180));
    }

    #[test]
    fn output_dir_joins_folder() {
        let config = MediaClientConfig {
            base_output_dir: PathBuf::from("/srv/comfy/output"),
            ..Default::default()
        };
        assert_eq!(
            config.output_dir("flux_examples"),
            PathBuf::from("/srv/comfy/output/flux_examples")
        );
    }
}
