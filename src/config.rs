use crate::cli::Cli;
use crate::client::{Client, ClientOptions};
use crate::field::{Coordinates, FieldId, Normalization};
use crate::logging::LoggingOptions;
use crate::session::SessionStore;
use anyhow::{Context, Result};
use etcetera::{choose_app_strategy, AppStrategy, AppStrategyArgs};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::info;

pub const ENV_PREFIX: &str = "FIELDFINDER_";

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(skip)]
    pub config_path: PathBuf,
    pub main: MainConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: Self::default_path(),
            main: MainConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct MainConfig {
    pub api_url: String,
    pub state_dir: PathBuf,
    pub logging: LoggingOptions,
    pub client: ClientOptions,
    /// Used for listings that come without usable coordinates
    pub default_coordinates: Coordinates,
    pub placeholder_photo: String,
    pub featured_fields: Vec<FieldId>,
    /// How many fields `featured` shows
    pub showcase_count: usize,
}

impl Default for MainConfig {
    fn default() -> Self {
        let normalization = Normalization::default();
        Self {
            api_url: "http://127.0.0.1:8000/api".to_string(),
            state_dir: Config::default_dirs().state.clone(),
            logging: LoggingOptions::default(),
            client: ClientOptions::default(),
            default_coordinates: normalization.default_coordinates,
            placeholder_photo: normalization.placeholder_photo,
            featured_fields: vec![1, 2, 3],
            showcase_count: 3,
        }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        let mut path = PathBuf::from(&Self::default_dirs().config);
        path.push("config.yml");
        path
    }

    pub fn default_dirs() -> &'static DefaultDirs {
        DEFAULT_DIRS.get_or_init(|| {
            match choose_app_strategy(AppStrategyArgs {
                top_level_domain: "ca".to_string(),
                author: "FieldFinder".to_string(),
                app_name: "Field Finder".to_string(),
            }) {
                Ok(strategy) => DefaultDirs {
                    config: strategy.config_dir(),
                    state: strategy.state_dir().unwrap_or(strategy.data_dir()),
                },
                // No home directory, fall back to the working directory.
                Err(_) => DefaultDirs {
                    config: PathBuf::from("."),
                    state: PathBuf::from("."),
                },
            }
        })
    }

    pub fn from_cli(args: &Cli) -> Result<Self> {
        let config_path = if let Some(path) = &args.config_path {
            path.to_owned()
        } else {
            Self::default_path()
        };

        let main = Figment::from(Serialized::defaults(MainConfig::default()))
            .merge(Yaml::file(&config_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Serialized::defaults(args))
            .extract()
            .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

        Ok(Config { config_path, main })
    }

    pub fn write_config_file(&self) -> Result<()> {
        if let Some(dir) = self.config_path.parent() {
            fs::create_dir_all(dir)?;
        }
        let yaml = serde_yaml::to_string(&self.main)?;
        fs::write(&self.config_path, yaml)?;
        info!("Wrote {}", self.config_path.display());
        Ok(())
    }

    pub fn client(&self) -> Client {
        Client::new(&self.main.api_url, &self.main.client)
    }

    pub fn session_store(&self) -> SessionStore {
        SessionStore::in_dir(&self.main.state_dir)
    }

    pub fn normalization(&self) -> Normalization {
        Normalization {
            default_coordinates: self.main.default_coordinates,
            placeholder_photo: self.main.placeholder_photo.clone(),
        }
    }
}

static DEFAULT_DIRS: OnceCell<DefaultDirs> = OnceCell::new();

#[derive(Debug, Deserialize, Serialize)]
pub struct DefaultDirs {
    pub config: PathBuf,
    pub state: PathBuf,
}
