mod config;
mod http;
mod logger;
mod state;
mod store;

use std::fmt::Display;
use std::path::PathBuf;

use clap::Parser;
use hyper::StatusCode;
use thiserror::Error;

pub use config::Config;
pub use state::State;

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the config file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    let config = Config::load(&args.config).await?;
    logger::init(config.loglevel)?;

    log::info!("Using config: {:?}", config);

    let bind = config.bind;
    let state = State::new(config);

    http::bind(bind, state, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for shutdown signal: {}", err);
        }

        log::info!("Received shutdown signal");
    })
    .await?;

    Ok(())
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Hyper(#[from] hyper::Error),
    #[error(transparent)]
    Store(#[from] store::StoreError),
    #[error(transparent)]
    Bracket(#[from] brackets_core::Error),
    #[error(transparent)]
    StatusCodeError(#[from] StatusCodeError),
    #[error("failed to load config: {0}")]
    Config(#[from] config::ConfigError),
    #[error("failed to install logger: {0}")]
    Logger(#[from] log::SetLoggerError),
}

impl Error {
    /// Converts the error into the [`StatusCodeError`] returned to the client. Returns `None`
    /// for internal errors.
    pub fn into_status_code_error(self) -> Option<StatusCodeError> {
        use brackets_core::ErrorKind;
        use store::StoreError;

        let from_bracket = |err: brackets_core::Error| {
            let code = match err.kind() {
                ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::InvalidState => StatusCode::CONFLICT,
            };

            StatusCodeError::new(code, err)
        };

        match self {
            Self::StatusCodeError(err) => Some(err),
            Self::Bracket(err) | Self::Store(StoreError::Bracket(err)) => Some(from_bracket(err)),
            Self::Store(err @ StoreError::NotFound(_)) => {
                Some(StatusCodeError::new(StatusCode::NOT_FOUND, err))
            }
            Self::Store(err @ StoreError::Conflict { .. }) => {
                Some(StatusCodeError::new(StatusCode::CONFLICT, err))
            }
            Self::Io(_) | Self::Json(_) | Self::Hyper(_) | Self::Config(_) | Self::Logger(_) => {
                None
            }
        }
    }
}

/// An error with an explicit status code and a message for the client.
#[derive(Clone, Debug, Error)]
#[error("{code}: {message}")]
pub struct StatusCodeError {
    pub code: StatusCode,
    pub message: String,
}

impl StatusCodeError {
    pub fn new<T>(code: StatusCode, message: T) -> Self
    where
        T: Display,
    {
        Self {
            code,
            message: message.to_string(),
        }
    }

    fn from_code(code: StatusCode) -> Self {
        Self {
            code,
            message: code.canonical_reason().unwrap_or_default().to_owned(),
        }
    }

    pub fn message<T>(mut self, message: T) -> Self
    where
        T: Display,
    {
        self.message = message.to_string();
        self
    }

    pub fn bad_request() -> Self {
        Self::from_code(StatusCode::BAD_REQUEST)
    }

    pub fn not_found() -> Self {
        Self::from_code(StatusCode::NOT_FOUND)
    }

    pub fn method_not_allowed() -> Self {
        Self::from_code(StatusCode::METHOD_NOT_ALLOWED)
    }

    pub fn request_timeout() -> Self {
        Self::from_code(StatusCode::REQUEST_TIMEOUT)
    }

    pub fn length_required() -> Self {
        Self::from_code(StatusCode::LENGTH_REQUIRED)
    }

    pub fn payload_too_large() -> Self {
        Self::from_code(StatusCode::PAYLOAD_TOO_LARGE)
    }

    pub fn internal_server_error() -> Self {
        Self::from_code(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use hyper::StatusCode;

    use super::{config, Error};

    #[test]
    fn test_error_from_config() {
        let err = Error::from(config::ConfigError::Io(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "denied",
        )));

        assert!(matches!(err, Error::Config(_)));
        assert_eq!(err.to_string(), "failed to load config: denied");
        assert!(err.into_status_code_error().is_none());
    }

    #[test]
    fn test_error_from_bracket() {
        let err = Error::from(brackets_core::Error::OpponentPending {
            match_id: 2,
            feeder: 1,
        });

        let err = err.into_status_code_error().unwrap();
        assert_eq!(err.code, StatusCode::CONFLICT);
    }
}
