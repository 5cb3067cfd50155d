//! Data source name encoding.
//!
//! ```text
//! user[:password]@host:port[/database[/schema]]?param1=value1&param2=value2
//! ```
//!
//! User, password, database and schema are form-url-encoded. Parameters are sorted by key so
//! that equal configs always produce equal strings.
use std::collections::BTreeMap;
use std::time::Duration;

use url::form_urlencoded;

use crate::config::{AuthType, Config};

pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_PROTOCOL: &str = "https";
const DEFAULT_REGION: &str = "us-west-2";
const HOST_SUFFIX: &str = "snowflakecomputing.com";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("account is empty")]
    EmptyAccount,
    #[error("user is empty")]
    EmptyUser,
    #[error("password is empty")]
    EmptyPassword,
    #[error("token is required for the oauth authenticator")]
    EmptyToken,
    #[error("AWS KMS key ARN is required for the kms_jwt authenticator")]
    EmptyKmsKeyArn,
    #[error("unknown authenticator: {0}")]
    UnknownAuthenticator(String),
    #[error("invalid DSN: {0}")]
    InvalidDsn(String),
    #[error("invalid port: {0}")]
    InvalidPort(String),
    #[error("invalid value for {name}: {value}")]
    InvalidParameter { name: String, value: String },
}

/// Encodes `config` as a DSN, filling in the host, port and protocol defaults.
pub fn dsn(config: &Config) -> Result<String, Error> {
    let host_given = !config.host.is_empty();
    let config = fill_missing_config_params(config)?;

    let mut dsn = encode(&config.user);
    if !config.password.is_empty() {
        dsn.push(':');
        dsn.push_str(&encode(&config.password));
    }
    dsn.push_str(&format!("@{}:{}", config.host, config.port));

    let mut params: BTreeMap<&str, String> = BTreeMap::new();
    if !config.database.is_empty() {
        dsn.push('/');
        dsn.push_str(&encode(&config.database));
        if !config.schema.is_empty() {
            dsn.push('/');
            dsn.push_str(&encode(&config.schema));
        }
    } else if !config.schema.is_empty() {
        params.insert("schema", config.schema.clone());
    }

    if host_given {
        params.insert("account", config.account.clone());
    }
    if config.authenticator != AuthType::Snowflake {
        params.insert("authenticator", config.authenticator.to_string());
    }
    let optional = [
        ("awsKmsKeyArn", &config.aws_kms_key_arn),
        ("warehouse", &config.warehouse),
        ("role", &config.role),
        ("region", &config.region),
        ("token", &config.token),
        ("application", &config.application),
    ];
    for (name, value) in optional {
        if !value.is_empty() {
            params.insert(name, value.clone());
        }
    }
    if config.protocol != DEFAULT_PROTOCOL {
        params.insert("protocol", config.protocol.clone());
    }
    let timeouts = [
        ("loginTimeout", config.login_timeout),
        ("requestTimeout", config.request_timeout),
        ("jwtTimeout", config.jwt_expire_timeout),
    ];
    for (name, value) in timeouts {
        if let Some(value) = value {
            params.insert(name, value.as_secs().to_string());
        }
    }

    if !params.is_empty() {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter())
            .finish();
        dsn.push('?');
        dsn.push_str(&query);
    }
    Ok(dsn)
}

/// Decodes a DSN produced by [`dsn`]. The account falls back to the first label of the host.
pub fn parse_dsn(dsn: &str) -> Result<Config, Error> {
    let (location, query) = dsn.split_once('?').unwrap_or((dsn, ""));
    let (user_info, location) = location
        .rsplit_once('@')
        .ok_or_else(|| Error::InvalidDsn("missing '@' after the user".to_string()))?;
    let (user, password) = user_info.split_once(':').unwrap_or((user_info, ""));
    let (authority, path) = location.split_once('/').unwrap_or((location, ""));
    let (host, port) = match authority.rsplit_once(':') {
        Some((host, port)) => (host, port.parse().map_err(|_| Error::InvalidPort(port.to_string()))?),
        None => (authority, DEFAULT_PORT),
    };

    let mut config = Config {
        user: decode(user)?,
        password: decode(password)?,
        host: host.to_string(),
        port,
        protocol: DEFAULT_PROTOCOL.to_string(),
        ..Default::default()
    };
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    if let Some(database) = segments.next() {
        config.database = decode(database)?;
    }
    if let Some(schema) = segments.next() {
        config.schema = decode(schema)?;
    }

    for (name, value) in form_urlencoded::parse(query.as_bytes()) {
        let value = value.into_owned();
        match &*name {
            "account" => config.account = value,
            "authenticator" => config.authenticator = value.parse()?,
            "awsKmsKeyArn" => config.aws_kms_key_arn = value,
            "database" => config.database = value,
            "schema" => config.schema = value,
            "warehouse" => config.warehouse = value,
            "role" => config.role = value,
            "region" => config.region = value,
            "protocol" => config.protocol = value,
            "token" => config.token = value,
            "application" => config.application = value,
            "loginTimeout" => config.login_timeout = Some(seconds(&name, value)?),
            "requestTimeout" => config.request_timeout = Some(seconds(&name, value)?),
            "jwtTimeout" => config.jwt_expire_timeout = Some(seconds(&name, value)?),
            other => tracing::debug!("ignoring unknown DSN parameter {}", other),
        }
    }
    if config.account.is_empty() {
        config.account = host.split('.').next().unwrap_or_default().to_string();
    }
    fill_missing_config_params(&config)
}

fn fill_missing_config_params(config: &Config) -> Result<Config, Error> {
    if config.account.is_empty() {
        return Err(Error::EmptyAccount);
    }
    if config.user.is_empty() {
        return Err(Error::EmptyUser);
    }
    match config.authenticator {
        AuthType::Snowflake if config.password.is_empty() => return Err(Error::EmptyPassword),
        AuthType::OAuth if config.token.is_empty() => return Err(Error::EmptyToken),
        AuthType::KmsJwt if config.aws_kms_key_arn.is_empty() => return Err(Error::EmptyKmsKeyArn),
        _ => {}
    }
    // timeouts travel as whole, non-zero seconds
    let timeouts = [
        ("loginTimeout", config.login_timeout),
        ("requestTimeout", config.request_timeout),
        ("jwtTimeout", config.jwt_expire_timeout),
    ];
    for (name, value) in timeouts {
        match value {
            Some(value) if value.is_zero() || value.subsec_nanos() != 0 => {
                return Err(Error::InvalidParameter {
                    name: name.to_string(),
                    value: format!("{value:?}"),
                })
            }
            _ => {}
        }
    }

    let mut config = config.clone();
    if config.host.is_empty() {
        config.host = if config.region.is_empty() || config.region == DEFAULT_REGION {
            format!("{}.{HOST_SUFFIX}", config.account)
        } else {
            format!("{}.{}.{HOST_SUFFIX}", config.account, config.region)
        };
    }
    if config.port == 0 {
        config.port = DEFAULT_PORT;
    }
    if config.protocol.is_empty() {
        config.protocol = DEFAULT_PROTOCOL.to_string();
    }
    Ok(config)
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn decode(value: &str) -> Result<String, Error> {
    let value = value.replace('+', " ");
    percent_encoding::percent_decode_str(&value)
        .decode_utf8()
        .map(|v| v.into_owned())
        .map_err(|_| Error::InvalidDsn(format!("{value} is not valid UTF-8")))
}

fn seconds(name: &str, value: String) -> Result<Duration, Error> {
    match value.parse::<u64>() {
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => Err(Error::InvalidParameter {
            name: name.to_string(),
            value,
        }),
    }
}
