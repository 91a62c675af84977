#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path;
use std::time::Duration;

use analyst_client::SocketConfig;
use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    ApiUrl,
    WsUrl,
    ConfigFile,
    DataDir,
    DownloadDir,
    ExportDir,
    Mock,
    SessionId,
    RequestTimeout,
    ReconnectAttempts,
    ReconnectDelay,
    HeartbeatInterval,
    LogLevel,
}

fn app_dir(base: Option<path::PathBuf>) -> path::PathBuf {
    return base
        .unwrap_or_else(|| return path::PathBuf::from("."))
        .join("analyst");
}

fn path_string(path: path::PathBuf) -> String {
    return path.to_string_lossy().to_string();
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    pub fn get_bool(key: ConfigKey) -> bool {
        return matches!(
            Config::get(key).to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        );
    }

    /// Numeric value, falling back to the default when unset or invalid.
    pub fn get_u64(key: ConfigKey) -> u64 {
        if let Ok(val) = Config::get(key).trim().parse::<u64>() {
            return val;
        }
        return Config::default(key).parse::<u64>().unwrap_or(0);
    }

    pub fn get_path(key: ConfigKey) -> path::PathBuf {
        return path::PathBuf::from(Config::get(key));
    }

    pub fn default(key: ConfigKey) -> String {
        let data_dir = app_dir(dirs::data_local_dir());

        let res = match key {
            ConfigKey::ApiUrl => "http://localhost:8000".to_string(),
            ConfigKey::WsUrl => "".to_string(),
            ConfigKey::DataDir => path_string(data_dir.clone()),
            ConfigKey::DownloadDir => match dirs::download_dir() {
                Some(dir) => path_string(dir),
                None => path_string(data_dir.join("downloads")),
            },
            ConfigKey::ExportDir => path_string(data_dir.join("exports")),
            ConfigKey::Mock => "false".to_string(),
            ConfigKey::RequestTimeout => "30".to_string(),
            ConfigKey::ReconnectAttempts => "5".to_string(),
            ConfigKey::ReconnectDelay => "1000".to_string(),
            ConfigKey::HeartbeatInterval => "30".to_string(),
            ConfigKey::LogLevel => "info".to_string(),

            // Special
            ConfigKey::ConfigFile => path_string(app_dir(dirs::config_dir()).join("config.toml")),
            ConfigKey::SessionId => "".to_string(),
        };

        return res;
    }

    pub fn request_timeout() -> Duration {
        return Duration::from_secs(Config::get_u64(ConfigKey::RequestTimeout).max(1));
    }

    pub fn socket_config() -> SocketConfig {
        let heartbeat = Config::get_u64(ConfigKey::HeartbeatInterval);
        return SocketConfig {
            max_reconnect_attempts: Config::get_u64(ConfigKey::ReconnectAttempts)
                .try_into()
                .unwrap_or(u32::MAX),
            base_reconnect_delay: Duration::from_millis(Config::get_u64(ConfigKey::ReconnectDelay)),
            heartbeat_interval: if heartbeat == 0 {
                None
            } else {
                Some(Duration::from_secs(heartbeat))
            },
            ..SocketConfig::default()
        };
    }

    fn find_arg(cmd: &Command, key: ConfigKey) -> Option<&clap::Arg> {
        let name = key.to_string();
        return cmd
            .get_arguments()
            .find(|e| return e.get_long() == Some(name.as_str()));
    }

    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(&config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(&config_path).await?;
            let doc = toml_str
                .parse::<toml_edit::Document>()
                .with_context(|| format!("Failed to parse {config_file}"))?;

            for key in ConfigKey::iter() {
                if let Some(val) = doc.get(&key.to_string()) {
                    // Use clap value parsers to do validation.
                    let mut possible_values = vec![];
                    if let Some(arg) = Config::find_arg(&cmd, key) {
                        possible_values = arg
                            .get_possible_values()
                            .iter()
                            .map(|e| return e.get_name().to_string())
                            .collect::<Vec<String>>();
                    }

                    if let Some(val_int) = val.as_integer() {
                        Config::set(key, &val_int.to_string());
                    } else if let Some(val_bool) = val.as_bool() {
                        Config::set(key, &val_bool.to_string());
                    } else if let Some(val_str) = val.as_str() {
                        if val_str.is_empty() {
                            continue;
                        }
                        if !possible_values.is_empty()
                            && !possible_values.contains(&val_str.to_string())
                        {
                            bail!(
                                "config.toml has an invalid value for key '{key}': {val_str}\nPossible values are: {}",
                                possible_values.join(", ")
                            );
                        }
                        Config::set(key, val_str);
                    }
                }
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        tracing::debug!(
            api_url = Config::get(ConfigKey::ApiUrl),
            ws_url = Config::get(ConfigKey::WsUrl),
            data_dir = Config::get(ConfigKey::DataDir),
            mock = Config::get_bool(ConfigKey::Mock),
            "config"
        );

        return Ok(());
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::SessionId || key == ConfigKey::ConfigFile {
                    return None;
                }

                let arg = Config::find_arg(&cmd, key)?;
                let mut description = arg
                    .get_help()
                    .map(|help| return help.to_string())
                    .unwrap_or_default();

                description = description
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                if !arg.get_possible_values().is_empty() {
                    let possible_values = arg
                        .get_possible_values()
                        .iter()
                        .map(|e| return e.get_name().to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    description = format!("{description} [possible values: {}]", possible_values);
                }

                let mut val = Config::default(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i64>().is_ok() || val.parse::<bool>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{}\"", val.replace('\\', "\\\\"));
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
