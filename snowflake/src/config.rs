use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use crate::dsn::Error;

/// How the driver authenticates to Snowflake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthType {
    /// User name and password. Not accepted by the SQL API.
    #[default]
    Snowflake,
    /// An OAuth access token obtained elsewhere, see [`Config::token`].
    OAuth,
    /// Key-pair JWT signed with an asymmetric key held in AWS KMS, see [`Config::aws_kms_key_arn`].
    KmsJwt,
}

impl AuthType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::Snowflake => "snowflake",
            AuthType::OAuth => "oauth",
            AuthType::KmsJwt => "kms_jwt",
        }
    }
}

impl Display for AuthType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "snowflake" => Ok(AuthType::Snowflake),
            "oauth" => Ok(AuthType::OAuth),
            "kms_jwt" => Ok(AuthType::KmsJwt),
            _ => Err(Error::UnknownAuthenticator(s.to_string())),
        }
    }
}

/// Connection settings. Encoded to and decoded from a DSN with [`crate::dsn::dsn`] and
/// [`crate::dsn::parse_dsn`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Account identifier, e.g. `xy12345` or `myorg-myaccount`.
    pub account: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub schema: String,
    pub warehouse: String,
    pub role: String,
    pub region: String,

    /// Defaults to `<account>[.<region>].snowflakecomputing.com`.
    pub host: String,
    /// Defaults to 443.
    pub port: u16,
    /// `https` or `http`. Defaults to `https`.
    pub protocol: String,

    pub authenticator: AuthType,
    /// OAuth access token.
    pub token: String,
    /// Key used to sign the JWT when `authenticator` is [`AuthType::KmsJwt`].
    pub aws_kms_key_arn: String,

    /// Upper bound for obtaining a session token.
    pub login_timeout: Option<Duration>,
    /// Upper bound for each request to the SQL API.
    pub request_timeout: Option<Duration>,
    /// Lifetime of the key-pair JWT. 60 seconds when unset.
    pub jwt_expire_timeout: Option<Duration>,
    pub application: String,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &str| if v.is_empty() { "" } else { "****" };
        f.debug_struct("Config")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &redact(&self.password))
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("warehouse", &self.warehouse)
            .field("role", &self.role)
            .field("region", &self.region)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("protocol", &self.protocol)
            .field("authenticator", &self.authenticator)
            .field("token", &redact(&self.token))
            .field("aws_kms_key_arn", &self.aws_kms_key_arn)
            .field("login_timeout", &self.login_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("jwt_expire_timeout", &self.jwt_expire_timeout)
            .field("application", &self.application)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{AuthType, Config};
    use crate::dsn::Error;

    #[test]
    fn test_auth_type_from_str() {
        assert_eq!(AuthType::KmsJwt, "KMS_JWT".parse().unwrap());
        assert_eq!(AuthType::OAuth, "oauth".parse().unwrap());
        assert_eq!(AuthType::Snowflake, "Snowflake".parse().unwrap());
        assert!(matches!("jwt".parse::<AuthType>(), Err(Error::UnknownAuthenticator(v)) if v == "jwt"));
        assert_eq!("kms_jwt", AuthType::KmsJwt.to_string());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config {
            account: "xy12345".to_string(),
            password: "hunter2".to_string(),
            token: "secret-token".to_string(),
            ..Default::default()
        };
        let text = format!("{config:?}");
        assert!(text.contains("xy12345"));
        assert!(!text.contains("hunter2"));
        assert!(!text.contains("secret-token"));
    }
}
