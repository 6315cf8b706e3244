/// [Result] alias for return types of the crate API
pub type Result<T> = std::result::Result<T, Error>;

/// Error enum type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Shutdown was requested while waiting. The mission stops where it is, no further command is sent.
    Interrupted,
    /// The flight service is gone, no command can be delivered anymore.
    Disconnected,
    /// An argument was out of range. The String contains the reason.
    InvalidArgument(String),
    /// The flight service refused or failed a request. The String contains the reason.
    ServiceError(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Interrupted => write!(f, "interrupted by shutdown request"),
            Error::Disconnected => write!(f, "flight service disconnected"),
            Error::InvalidArgument(reason) => write!(f, "invalid argument: {}", reason),
            Error::ServiceError(reason) => write!(f, "flight service error: {}", reason),
        }
    }
}

impl std::error::Error for Error {}

impl From<flume::RecvError> for Error {
    fn from(_: flume::RecvError) -> Self {
        self::Error::Disconnected
    }
}

impl<T> From<flume::SendError<T>> for Error {
    fn from(_: flume::SendError<T>) -> Self {
        self::Error::Disconnected
    }
}
