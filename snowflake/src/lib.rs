//! # sfkms-snowflake
//!
//! A small Snowflake driver on top of the [SQL API](https://docs.snowflake.com/en/developer-guide/sql-api/index),
//! authenticating with a key-pair JWT whose private key never leaves AWS KMS.
//!
//! ## Quickstart
//!
//! ```rust
//! use sfkms_snowflake::config::{AuthType, Config};
//! use sfkms_snowflake::db::Db;
//! use sfkms_snowflake::dsn::dsn;
//!
//! async fn run() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         account: "xy12345".to_string(),
//!         user: "jsmith".to_string(),
//!         authenticator: AuthType::KmsJwt,
//!         aws_kms_key_arn: "arn:aws:kms:us-east-1:123456789:key/mrk-1".to_string(),
//!         ..Default::default()
//!     };
//!     let db = Db::open(&dsn(&config)?)?;
//!     let mut rows = db.query("SELECT 1").await?;
//!     while let Some(row) = rows.next().await? {
//!         let v: i64 = row.column(0)?;
//!     }
//!     db.close();
//!     Ok(())
//! }
//! ```
//!
//! AWS credentials come from `AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY` or the EC2 instance
//! role. The public key registered on the Snowflake user must be the KMS key's public key.
pub mod cancel;
pub mod config;
pub mod db;
pub mod dsn;
pub mod error;
pub mod http;
pub mod rows;
