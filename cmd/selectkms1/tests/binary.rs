//! Runs the built `selectkms1` executable against the mock servers and checks what a user sees:
//! stdout, stderr and the exit status.
use std::process::Output;

use sfkms_mock::{KmsMockServer, MockResult, SnowflakeMockServer};
use tokio::process::Command;

use selectkms1::config::*;

const KEY_ARN: &str = "arn:aws:kms:us-east-1:123456789:key/mrk-123456789";
const CONGRATS: &str = "Congrats! You have successfully run SELECT 1 with Snowflake DB!\n";

struct Fixture {
    snowflake: SnowflakeMockServer,
    kms: KmsMockServer,
}

impl Fixture {
    async fn start(result: MockResult) -> Self {
        Self {
            snowflake: SnowflakeMockServer::start(result).await.unwrap(),
            kms: KmsMockServer::start(b"public-key".to_vec(), b"signature".to_vec())
                .await
                .unwrap(),
        }
    }

    /// The executable with a clean environment pointing at the mocks. AWS settings go through
    /// the SDK's own environment variables.
    fn command(&self) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_selectkms1"));
        command
            .env_clear()
            .env(ENV_ACCOUNT, "xy12345")
            .env(ENV_USER, "jsmith")
            .env(ENV_HOST, self.snowflake.host())
            .env(ENV_PORT, self.snowflake.port().to_string())
            .env(ENV_PROTOCOL, "http")
            .env(ENV_KMS_ARN, KEY_ARN)
            .env("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE")
            .env("AWS_SECRET_ACCESS_KEY", "secret")
            .env("AWS_ENDPOINT_URL", &self.kms.endpoint)
            .env("AWS_ENDPOINT_URL_KMS", &self.kms.endpoint)
            .env("AWS_EC2_METADATA_DISABLED", "true")
            .env("AWS_CONFIG_FILE", "/nonexistent/aws/config")
            .env("AWS_SHARED_CREDENTIALS_FILE", "/nonexistent/aws/credentials");
        command
    }
}

async fn output(command: &mut Command) -> (Output, String, String) {
    let output = command.output().await.unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    (output, stdout, stderr)
}

#[tokio::test]
async fn test_binary_success() {
    let fixture = Fixture::start(MockResult::single_value("1")).await;
    let (output, stdout, stderr) = output(&mut fixture.command()).await;
    assert_eq!(Some(0), output.status.code(), "{stderr}");
    assert_eq!(CONGRATS, stdout);
    assert!(!stderr.contains("ERROR"), "{stderr}");
    assert_eq!(1, fixture.kms.count("TrentService.Sign"));
    assert_eq!("KEYPAIR_JWT", fixture.snowflake.submitted()[0].token_type);
}

#[tokio::test]
async fn test_binary_mismatch_exits_non_zero() {
    let fixture = Fixture::start(MockResult::single_value("2")).await;
    let (output, stdout, stderr) = output(&mut fixture.command()).await;
    assert_eq!(Some(1), output.status.code());
    assert_eq!("", stdout);
    assert!(stderr.contains("failed to get 1. got: 2"), "{stderr}");
    // stderr is a pipe here
    assert!(!stderr.contains('\u{1b}'), "{stderr}");
}

#[tokio::test]
async fn test_binary_row_error_exits_zero() {
    let result = MockResult::single_value("1")
        .with_partition(vec![vec![Some("1".to_string())]])
        .with_failing_partition(1);
    let fixture = Fixture::start(result).await;
    let (output, stdout, _) = output(&mut fixture.command()).await;
    assert_eq!(Some(0), output.status.code());
    assert!(stdout.starts_with("ERROR: "), "{stdout}");
    assert!(!stdout.contains("Congrats"), "{stdout}");
}

#[tokio::test]
async fn test_binary_missing_variable_with_logging_off() {
    let fixture = Fixture::start(MockResult::single_value("1")).await;
    for rust_log in ["off", "sfkms_snowflake=debug"] {
        let mut command = fixture.command();
        command.env_remove(ENV_ACCOUNT).env("RUST_LOG", rust_log);
        let (output, stdout, stderr) = output(&mut command).await;
        assert_eq!(Some(1), output.status.code());
        assert_eq!("", stdout);
        assert!(
            stderr.contains("SNOWFLAKE_TEST_ACCOUNT environment variable is not set."),
            "RUST_LOG={rust_log}: {stderr}"
        );
    }
    assert!(fixture.snowflake.submitted().is_empty());
    assert!(fixture.kms.requests().is_empty());
}
