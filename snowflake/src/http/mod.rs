pub mod error;
pub mod snowflake_client;
pub mod statement;
