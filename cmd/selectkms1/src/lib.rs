//! Runs `SELECT 1` against Snowflake, authenticating with a key-pair JWT signed by an AWS KMS key.
//!
//! The matching public key must be assigned to the Snowflake user
//! (https://docs.snowflake.com/en/user-guide/key-pair-auth), and the AWS identity running the
//! program needs `kms:Sign` and `kms:GetPublicKey` on the key.
//!
//! ```text
//! SNOWFLAKE_TEST_ACCOUNT=xy12345 SNOWFLAKE_TEST_USER=jsmith \
//! SNOWFLAKE_TEST_KMSARN="arn:aws:kms:us-east-1:123456789:key/mrk-123456789" selectkms1
//! ```
//!
//! No cancellation is wired in: the query runs until it completes or fails.
pub mod app;
pub mod config;
pub mod env;
pub mod error;
