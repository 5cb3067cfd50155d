use aws_sdk_kms::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A failed KMS call: a service exception, or a transport, credentials or timeout failure.
    #[error("{message}")]
    Service {
        /// Exception name such as `AccessDeniedException`. `None` when the service never answered.
        code: Option<String>,
        message: String,
        #[source]
        source: Box<aws_sdk_kms::Error>,
    },

    #[error("invalid KMS key ARN: {0}")]
    InvalidKeyArn(String),

    #[error("KMS response has no {0}")]
    MissingField(&'static str),
}

impl Error {
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::Service { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

impl<E, R> From<SdkError<E, R>> for Error
where
    aws_sdk_kms::Error: From<SdkError<E, R>>,
{
    fn from(e: SdkError<E, R>) -> Self {
        let source = aws_sdk_kms::Error::from(e);
        let code = source.code().map(str::to_string);
        let message = match &code {
            Some(code) => format!("{code}: {}", source.message().unwrap_or_default()),
            None => DisplayErrorContext(&source).to_string(),
        };
        Error::Service {
            code,
            message,
            source: Box::new(source),
        }
    }
}
