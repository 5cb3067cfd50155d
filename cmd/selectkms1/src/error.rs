use std::num::ParseIntError;

use sfkms_snowflake::config::Config;
use sfkms_snowflake::dsn;
use sfkms_snowflake::error::Error as DbError;
use sfkms_snowflake::rows::row;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0} environment variable is not set.")]
    MissingVariable(&'static str),

    #[error("failed to create DSN from Config: <none>, err: invalid port {value:?}: {source}")]
    InvalidPort { value: String, source: ParseIntError },

    #[error("failed to create DSN from Config: {config:?}, err: {source}")]
    Dsn { config: Box<Config>, source: dsn::Error },

    #[error("failed to connect. {dsn}, err: {source}")]
    Open { dsn: String, source: DbError },

    #[error("failed to run a query. {query}, err: {source}")]
    Query { query: String, source: DbError },

    #[error("failed to get result. err: {0}")]
    Scan(#[source] row::Error),

    #[error("failed to get 1. got: {0}")]
    Mismatch(i64),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}
