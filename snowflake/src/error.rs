use crate::config::AuthType;
use crate::dsn;
use crate::http::error::Error as HttpError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Dsn(#[from] dsn::Error),
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error(transparent)]
    Auth(#[from] sfkms_auth::error::Error),
    #[error(transparent)]
    Kms(#[from] sfkms_aws_kms::error::Error),
    #[error("authenticator {0} is not supported by the SQL API")]
    UnsupportedAuthenticator(AuthType),
    #[error("statement cancelled")]
    Cancelled,
    #[error("database is closed")]
    Closed,
}
