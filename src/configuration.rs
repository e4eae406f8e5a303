use config::ConfigError;

/// Runtime settings, built once in `main` and handed to the constructors
/// that need them. There is no global settings value.
#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub redis: RedisSettings,
    pub jwt: JwtSettings,
    pub directions: DirectionsSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// Connection settings for the refresh-token revocation store.
#[derive(serde::Deserialize, Clone)]
pub struct RedisSettings {
    pub url: String,
}

/// JWT authentication settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expiry_minutes: i64,
    pub refresh_token_expiry_minutes: i64,
}

/// Directions API settings (Mapbox-compatible endpoint).
#[derive(serde::Deserialize, Clone)]
pub struct DirectionsSettings {
    pub base_url: String,
    pub access_token: String,
    pub timeout_seconds: u64,
}

/// Reads `configuration.yaml` (optional) and then applies `APP_`-prefixed
/// environment variables, e.g. `APP_JWT__SECRET` overrides `jwt.secret`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;
    settings.try_deserialize::<Settings>()
}
