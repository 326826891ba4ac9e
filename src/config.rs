use crate::error::{BadEnvVarSnafu, ParseNumberSnafu, RegistrarResult};
use dotenvy::var;
use secrecy::{ExposeSecret, SecretString};
use snafu::ResultExt;
use std::sync::Arc;

const DEFAULT_SERVER_IP: &str = "127.0.0.1:8080";
///comfortably above the photo cap, so oversized photos get dropped by the mapping rather than rejected by the transport
const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct RuntimeConfiguration {
    db_config: Arc<DbConfig>,
    server_ip: Arc<str>,
    max_body_bytes: usize,
}

impl RuntimeConfiguration {
    pub fn new() -> RegistrarResult<Self> {
        let server_ip = var("REGISTRAR_SERVER_IP").unwrap_or_else(|_| DEFAULT_SERVER_IP.to_string());
        let max_body_bytes = match var("REGISTRAR_MAX_BODY_BYTES") {
            Ok(limit) => limit.parse().context(ParseNumberSnafu {
                name: "REGISTRAR_MAX_BODY_BYTES",
            })?,
            Err(_) => DEFAULT_MAX_BODY_BYTES,
        };

        Ok(Self {
            db_config: Arc::new(DbConfig::new()?),
            server_ip: server_ip.into(),
            max_body_bytes,
        })
    }

    pub fn db_config(&self) -> Arc<DbConfig> {
        self.db_config.clone()
    }

    pub fn server_ip(&self) -> &str {
        &self.server_ip
    }

    pub const fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }
}

#[derive(Debug)]
pub struct DbConfig {
    user: String,
    password: SecretString,
    path: String,
    port: u16,
    database: String,
}

impl DbConfig {
    pub fn new() -> RegistrarResult<Self> {
        let get_env_var = |name| var(name).context(BadEnvVarSnafu { name });

        Ok(Self {
            user: get_env_var("DB_USER")?,
            password: SecretString::from(get_env_var("DB_PASSWORD")?),
            path: get_env_var("DB_PATH")?,
            port: get_env_var("DB_PORT")?
                .parse()
                .context(ParseNumberSnafu { name: "DB_PORT" })?,
            database: get_env_var("DB_NAME")?,
        })
    }

    pub fn get_db_path(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user,
            self.password.expose_secret(),
            self.path,
            self.port,
            self.database
        )
    }
}
