//! Runtime configuration: environment settings plus the YAML rotation and command files.

use std::{
    collections::HashSet,
    env,
    fmt::Display,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::state::server::{ConditionSet, RotationPolicy, ServerKey};

const DEFAULT_PORT: u16 = 8181;
const DEFAULT_SPECTATOR_NAME: &str = "twitch.tv/BF2tv";
const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.bflist.io";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 4000;
const DEFAULT_ROTATION_CONFIG_PATH: &str = "config/servers.yaml";
const DEFAULT_CUSTOM_COMMANDS_PATH: &str = "config/custom-commands.yaml";

/// Immutable process settings read once from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// TCP port the HTTP server listens on.
    pub port: u16,
    /// Key required on admin routes; admin routes are open when unset.
    pub app_key: Option<String>,
    /// Base URL of the bflist API.
    pub provider_base_url: String,
    /// Timeout applied to every outgoing HTTP request.
    pub request_timeout: Duration,
    /// Optional relay receiving chat announcements.
    pub announce_webhook_url: Option<String>,
    /// Location of the rotation file.
    pub rotation_config_path: PathBuf,
    /// Location of the custom commands file.
    pub custom_commands_path: PathBuf,
    /// Tunables of the rotation engine.
    pub rotation: RotationSettings,
}

/// Tunables of the rotation engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationSettings {
    /// Account name of the spectator client, never counted as a human player.
    pub spectator_name: String,
    /// Dwell time on a server before an automatic switch is allowed.
    pub minimum_time_on_server: Duration,
    /// Minutes between two score ticks.
    pub score_interval_minutes: u64,
    /// Capacity of each server's score history.
    pub score_sample_size: usize,
    /// Share of the score attributed to active players.
    pub active_player_ratio: f64,
    /// Fill ratio above which no free slot penalty applies.
    pub free_slot_penalty_threshold: f64,
    /// Lower bound of the free slot penalty factor.
    pub max_free_slot_penalty: f64,
    /// Mean time per followed player under which the spectator is considered stuck.
    pub average_time_on_player_threshold: Duration,
    /// Number of player rotations averaged for the stuck detection.
    pub average_time_on_player_sample_size: usize,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            spectator_name: DEFAULT_SPECTATOR_NAME.to_string(),
            minimum_time_on_server: Duration::from_secs(15 * 60),
            score_interval_minutes: 5,
            score_sample_size: 5,
            active_player_ratio: 0.1,
            free_slot_penalty_threshold: 0.9,
            max_free_slot_penalty: 0.5,
            average_time_on_player_threshold: Duration::from_secs(3),
            average_time_on_player_sample_size: 15,
        }
    }
}

impl Settings {
    /// Read settings from the environment, falling back to defaults for unset or bad values.
    pub fn from_env() -> Self {
        let defaults = RotationSettings::default();
        let rotation = RotationSettings {
            spectator_name: env_string("SPECTATOR_NAME")
                .unwrap_or_else(|| DEFAULT_SPECTATOR_NAME.to_string()),
            minimum_time_on_server: Duration::from_secs(
                env_or("MINIMUM_TIME_ON_SERVER", 15u64).saturating_mul(60),
            ),
            score_interval_minutes: env_or(
                "ROTATION_SCORE_INTERVAL",
                defaults.score_interval_minutes,
            ),
            score_sample_size: env_or("ROTATION_SCORE_SAMPLE_SIZE", defaults.score_sample_size),
            active_player_ratio: env_or("ACTIVE_PLAYER_SCORE_RATIO", defaults.active_player_ratio),
            free_slot_penalty_threshold: env_or(
                "FREE_SLOT_SCORE_PENALTY_THRESHOLD",
                defaults.free_slot_penalty_threshold,
            ),
            max_free_slot_penalty: env_or("MAX_FREE_SLOT_PENALTY", defaults.max_free_slot_penalty),
            average_time_on_player_threshold: Duration::try_from_secs_f64(env_or(
                "AVERAGE_TIME_ON_PLAYER_THRESHOLD",
                3.0f64,
            ))
            .unwrap_or(defaults.average_time_on_player_threshold),
            average_time_on_player_sample_size: env_or(
                "AVERAGE_TIME_ON_PLAYER_SAMPLE_SIZE",
                defaults.average_time_on_player_sample_size,
            ),
        };

        Self {
            port: env_or("PORT", DEFAULT_PORT),
            app_key: env_string("APP_KEY"),
            provider_base_url: env_string("PROVIDER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_PROVIDER_BASE_URL.to_string()),
            request_timeout: Duration::from_millis(env_or(
                "REQUEST_TIMEOUT",
                DEFAULT_REQUEST_TIMEOUT_MS,
            )),
            announce_webhook_url: env_string("ANNOUNCE_WEBHOOK_URL"),
            rotation_config_path: env_string("ROTATION_CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ROTATION_CONFIG_PATH)),
            custom_commands_path: env_string("CUSTOM_COMMANDS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CUSTOM_COMMANDS_PATH)),
            rotation,
        }
    }
}

/// Non-empty environment variable value.
fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Parse an environment variable, keeping `default` when unset or malformed.
fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env_string(name) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    variable = name,
                    value = %raw,
                    error = %err,
                    default = %default,
                    "invalid environment value; using default"
                );
                default
            }
        },
        None => default,
    }
}

/// Failures while loading a YAML configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read `{path}`")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid YAML or does not have the expected shape.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// An entry failed validation; the whole file is rejected.
    #[error("entry #{index} is invalid: {reason}")]
    Invalid { index: usize, reason: String },
}

/// A validated rotation entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Identity of the server.
    pub key: ServerKey,
    /// How the server takes part in the rotation.
    pub policy: RotationPolicy,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawServerConfig {
    ip: String,
    port: u32,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    rotation_config: RawRotationConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRotationConfig {
    weight: Option<f64>,
    /// Deprecated location of `conditions.minPlayers`.
    min_players: Option<u32>,
    #[serde(default)]
    fallback: bool,
    #[serde(default)]
    temporary: bool,
    #[serde(default)]
    ignored: bool,
    conditions: Option<ConditionSet>,
}

impl RawServerConfig {
    fn validate(self, index: usize) -> Result<ServerConfig, ConfigError> {
        let invalid = |reason: &str| ConfigError::Invalid {
            index,
            reason: reason.to_string(),
        };

        let host = self.ip.trim().to_string();
        if host.is_empty() {
            return Err(invalid("ip must not be empty"));
        }
        let port = u16::try_from(self.port)
            .ok()
            .filter(|port| *port > 0)
            .ok_or_else(|| invalid("port must be within 1..=65535"))?;

        let raw = self.rotation_config;
        let weight = raw.weight.unwrap_or(1.0);
        if !weight.is_finite() || weight < 0.0 {
            return Err(invalid("weight must be a finite, non-negative number"));
        }

        let mut conditions = raw.conditions;
        if let Some(min_players) = raw.min_players {
            warn!(
                host = %host,
                port,
                "rotationConfig.minPlayers is deprecated, use rotationConfig.conditions.minPlayers instead"
            );
            let set = conditions.get_or_insert_with(ConditionSet::default);
            set.min_players.get_or_insert(min_players);
        }

        let password = self.password.filter(|password| !password.is_empty());
        Ok(ServerConfig {
            key: ServerKey::new(host, port, password),
            policy: RotationPolicy {
                weight,
                fallback: raw.fallback,
                temporary: raw.temporary,
                ignored: raw.ignored,
                conditions,
            },
        })
    }
}

/// Parse and validate the content of a rotation file.
pub fn parse_rotation(contents: &str) -> Result<Vec<ServerConfig>, ConfigError> {
    let raw: Option<Vec<RawServerConfig>> = serde_yaml::from_str(contents)?;

    let mut seen = HashSet::new();
    let mut servers = Vec::new();
    for (index, entry) in raw.unwrap_or_default().into_iter().enumerate() {
        let config = entry.validate(index)?;
        if !seen.insert(config.key.clone()) {
            warn!(server = %config.key, "duplicate rotation entry; keeping the first one");
            continue;
        }
        servers.push(config);
    }
    Ok(servers)
}

/// Read and validate the rotation file, failing on any read, parse or validation error.
pub fn read_rotation(path: &Path) -> Result<Vec<ServerConfig>, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_rotation(&contents)
}

/// Load the rotation file, yielding an empty rotation when it is missing or malformed.
pub fn load_rotation(path: &Path) -> Vec<ServerConfig> {
    load_list(path, "rotation", parse_rotation)
}

/// Chat roles allowed to trigger a custom command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Any viewer.
    Viewer,
    /// Channel subscribers.
    Subscriber,
    /// VIPs.
    Vip,
    /// Channel moderators.
    Moderator,
    /// The broadcaster.
    Broadcaster,
}

/// Static chat command answered by the external chat layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomCommand {
    /// Primary command name.
    pub identifier: String,
    /// Alternative names.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Roles allowed to use the command.
    pub permitted_roles: Vec<Role>,
    /// Canned response text.
    pub response: String,
    /// Optional help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Parse and validate the content of a custom commands file.
pub fn parse_custom_commands(contents: &str) -> Result<Vec<CustomCommand>, ConfigError> {
    let commands: Option<Vec<CustomCommand>> = serde_yaml::from_str(contents)?;
    let commands = commands.unwrap_or_default();
    for (index, command) in commands.iter().enumerate() {
        if command.identifier.trim().is_empty() {
            return Err(ConfigError::Invalid {
                index,
                reason: "identifier must not be empty".to_string(),
            });
        }
    }
    Ok(commands)
}

/// Load the custom commands file, yielding no commands when it is missing or malformed.
pub fn load_custom_commands(path: &Path) -> Vec<CustomCommand> {
    load_list(path, "custom commands", parse_custom_commands)
}

fn load_list<T>(
    path: &Path,
    what: &str,
    parse: fn(&str) -> Result<Vec<T>, ConfigError>,
) -> Vec<T> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "{what} file not found; starting without entries");
            return Vec::new();
        }
        Err(source) => {
            let err = ConfigError::Read {
                path: path.display().to_string(),
                source,
            };
            error!(error = %err, "failed to load {what} file");
            return Vec::new();
        }
    };

    match parse(&contents) {
        Ok(entries) => {
            info!(path = %path.display(), count = entries.len(), "loaded {what} file");
            entries
        }
        Err(err) => {
            error!(path = %path.display(), error = %err, "failed to load {what} file");
            Vec::new()
        }
    }
}
