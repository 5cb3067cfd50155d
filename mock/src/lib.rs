//! Mock servers for tests.
//!
//! [`SnowflakeMockServer`] serves the subset of the Snowflake SQL API v2 the driver uses and
//! [`KmsMockServer`] answers `TrentService.Sign` and `TrentService.GetPublicKey`. Both bind to
//! `127.0.0.1` on a random port and stop when dropped.

mod kms;
mod snowflake;

pub use kms::{KmsMockServer, KmsRequest};
pub use snowflake::{MockResult, SnowflakeMockServer, SubmittedStatement, STATEMENT_HANDLE};
