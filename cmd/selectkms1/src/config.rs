use sfkms_snowflake::config::{AuthType, Config};
use sfkms_snowflake::dsn::{dsn, DEFAULT_PORT};

use crate::env::{lookup, Environment};
use crate::error::Error;

pub const ENV_ACCOUNT: &str = "SNOWFLAKE_TEST_ACCOUNT";
pub const ENV_USER: &str = "SNOWFLAKE_TEST_USER";
pub const ENV_PASSWORD: &str = "SNOWFLAKE_TEST_PASSWORD";
pub const ENV_HOST: &str = "SNOWFLAKE_TEST_HOST";
pub const ENV_PORT: &str = "SNOWFLAKE_TEST_PORT";
pub const ENV_PROTOCOL: &str = "SNOWFLAKE_TEST_PROTOCOL";
pub const ENV_KMS_ARN: &str = "SNOWFLAKE_TEST_KMSARN";

/// Connection settings read from the environment together with their DSN.
#[derive(Debug, Clone)]
pub struct Assembled {
    pub config: Config,
    pub dsn: String,
}

/// Builds the KMS JWT connection config. Nothing here touches the network.
pub fn assemble(env: &dyn Environment) -> Result<Assembled, Error> {
    let account = lookup(env, ENV_ACCOUNT, true)?;
    let user = lookup(env, ENV_USER, true)?;
    let password = lookup(env, ENV_PASSWORD, false)?;
    let host = lookup(env, ENV_HOST, false)?;
    let port = lookup(env, ENV_PORT, false)?;
    let protocol = lookup(env, ENV_PROTOCOL, false)?;
    let aws_kms_key_arn = lookup(env, ENV_KMS_ARN, true)?;

    let port = if port.is_empty() {
        DEFAULT_PORT
    } else {
        port.parse()
            .map_err(|source| Error::InvalidPort { value: port.clone(), source })?
    };
    let config = Config {
        account,
        user,
        password,
        host,
        port,
        protocol,
        authenticator: AuthType::KmsJwt,
        aws_kms_key_arn,
        ..Default::default()
    };
    let dsn = dsn(&config).map_err(|source| Error::Dsn {
        config: Box::new(config.clone()),
        source,
    })?;
    Ok(Assembled { config, dsn })
}
