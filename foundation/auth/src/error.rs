#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("account is required for key-pair authentication")]
    EmptyAccount,

    #[error("user is required for key-pair authentication")]
    EmptyUser,

    #[error("token is required for OAuth authentication")]
    EmptyToken,

    #[error("signer returned an empty signature")]
    EmptySignature,

    #[error("invalid token")]
    InvalidToken,

    #[error("token cache lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Kms(#[from] sfkms_aws_kms::error::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
}
