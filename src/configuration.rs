use crate::error::ConfigError;

const MIN_SECRET_LENGTH: usize = 32;
/// One year
const MAX_TOKEN_EXPIRY_SECONDS: i64 = 365 * 24 * 60 * 60;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub redis: RedisSettings,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub cookie: CookieSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
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
}

/// Session store (Redis) settings
#[derive(serde::Deserialize, Clone)]
pub struct RedisSettings {
    pub url: String,
}

/// JWT authentication settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expiry: i64,   // seconds (e.g., 900 for 15 minutes)
    pub refresh_token_expiry: i64,  // seconds (e.g., 604800 for 7 days)
    pub issuer: String,
}

impl JwtSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::InvalidValue(format!(
                "jwt.secret must be at least {} bytes",
                MIN_SECRET_LENGTH
            )));
        }
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt.issuer".to_string()));
        }
        if self.access_token_expiry <= 0 || self.refresh_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(
                "jwt token expiries must be positive".to_string(),
            ));
        }
        if self.access_token_expiry > MAX_TOKEN_EXPIRY_SECONDS
            || self.refresh_token_expiry > MAX_TOKEN_EXPIRY_SECONDS
        {
            return Err(ConfigError::InvalidValue(format!(
                "jwt token expiries must not exceed {} seconds",
                MAX_TOKEN_EXPIRY_SECONDS
            )));
        }
        if self.access_token_expiry >= self.refresh_token_expiry {
            return Err(ConfigError::InvalidValue(
                "jwt.access_token_expiry must be shorter than jwt.refresh_token_expiry".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    Lax,
    Strict,
    None,
}

/// Refresh-token cookie attributes
#[derive(serde::Deserialize, Clone, Debug)]
#[serde(default)]
pub struct CookieSettings {
    pub name: String,
    /// Keep narrow so the cookie only travels to the auth endpoints
    pub path: String,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSitePolicy,
    /// Also return the refresh token in login/refresh JSON bodies
    pub expose_refresh_token: bool,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            name: "refresh_token".to_string(),
            path: "/auth".to_string(),
            domain: None,
            secure: true,
            http_only: true,
            same_site: SameSitePolicy::Lax,
            expose_refresh_token: false,
        }
    }
}

impl CookieSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingRequired("cookie.name".to_string()));
        }
        if !self.path.starts_with('/') {
            return Err(ConfigError::InvalidValue(
                "cookie.path must start with '/'".to_string(),
            ));
        }
        // Browsers drop SameSite=None cookies that are not Secure.
        if self.same_site == SameSitePolicy::None && !self.secure {
            return Err(ConfigError::InvalidValue(
                "cookie.same_site = None requires cookie.secure = true".to_string(),
            ));
        }
        Ok(())
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jwt.validate()?;
        self.cookie.validate()
    }
}

/// Load settings from `configuration.{yaml,toml,json}` (optional) overridden by
/// `APP_`-prefixed environment variables, e.g. `APP_JWT__SECRET`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    let settings = settings.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}
