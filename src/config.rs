use config::{Config, ConfigError, File};
use secrecy::Secret;
use serde_aux::field_attributes::deserialize_number_from_string;
use std::time;

const DEFAULT_MAILCHIMP_SERVER: &str = "us3";

#[derive(Debug)]
pub enum Environment {
    Development,
    Production,
}

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub mailchimp: MailchimpSettings,
    pub dashboard: DashboardSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    // An empty list lets any origin call the API
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    // Answers form submissions without reaching Mailchimp
    #[serde(default)]
    pub simulate_submissions: bool,
}

#[derive(serde::Deserialize, Clone)]
pub struct MailchimpSettings {
    pub server: Option<String>,
    pub base_url: Option<String>,
    // secrecy protects secret information and prevents them to be exposed (eg: via logs)
    pub api_key: Option<Secret<String>>,
    pub list_id: Option<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

#[derive(serde::Deserialize, Clone)]
pub struct DashboardSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub member_fetch_count: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub page_size: usize,
}

impl Settings {
    pub fn get_address(&self) -> String {
        format!(
            "{}:{}",
            self.application.get_host(),
            self.application.get_port()
        )
    }

    pub fn get_mailchimp_base_url(&self) -> String {
        self.mailchimp.get_base_url()
    }

    pub fn set_mailchimp_base_url(&mut self, new_base_url: String) {
        self.mailchimp.base_url = Some(new_base_url)
    }

    pub fn set_app_port(&mut self, port: u16) {
        self.application.port = port;
    }
}

impl ApplicationSettings {
    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_host(&self) -> String {
        self.host.clone()
    }
}

impl MailchimpSettings {
    pub fn get_server(&self) -> String {
        self.server
            .clone()
            .filter(|server| !server.trim().is_empty())
            .unwrap_or_else(|| String::from(DEFAULT_MAILCHIMP_SERVER))
    }

    /// Mailchimp routes each account through its own data center, so the API host depends on the
    /// server prefix unless an explicit base url is configured.
    pub fn get_base_url(&self) -> String {
        match &self.base_url {
            Some(base_url) if !base_url.trim().is_empty() => {
                base_url.trim_end_matches('/').to_string()
            }
            _ => format!("https://{}.api.mailchimp.com/3.0", self.get_server()),
        }
    }

    pub fn get_timeout(&self) -> time::Duration {
        time::Duration::from_millis(self.timeout_milliseconds)
    }
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            unknown_env => Err(format!(
                "{} is not supported environment. Use either 'development' or 'production'.",
                unknown_env
            )),
        }
    }
}

/// Reads the first non-empty variable among `names`.
fn read_env_var(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let root_path = std::env::current_dir().map_err(|err| {
        ConfigError::Message(format!(
            "Failed to determine the current directory: {}",
            err
        ))
    })?;
    let config_directory = root_path.join("config");
    // Uses development environment by default
    let enviroment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "development".into())
        .try_into()
        .map_err(ConfigError::Message)?;
    let config_base_filepath = config_directory.join("base");
    let config_env_filepath = config_directory.join(enviroment.as_str());

    // It merges the base configuration file with the one from the specific environment (development or production)
    let settings = Config::builder()
        .add_source(File::from(config_base_filepath).required(true))
        .add_source(File::from(config_env_filepath).required(true))
        // Merge settings from environment variables with a prefix of APP and "__" separator
        // E.g APP_APPLICATION__PORT would set Settings.application.port
        .add_source(config::Environment::with_prefix("app").separator("__"))
        // The variables the serverless handlers were deployed with win over everything else
        .set_override_option(
            "mailchimp.api_key",
            read_env_var(&["MAILCHIMP_API_KEY", "VITE_MAILCHIMP_API_KEY"]),
        )?
        .set_override_option("mailchimp.server", read_env_var(&["MAILCHIMP_SERVER"]))?
        .set_override_option("mailchimp.list_id", read_env_var(&["MAILCHIMP_LIST_ID"]))?
        .build()?;

    tracing::info!("Application environment = {:?}", enviroment);

    // Try to convert the value from the configuration file into a Settings type
    settings.try_deserialize()
}
