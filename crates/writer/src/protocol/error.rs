use std::fmt;
use std::io;
use thiserror::Error;

/// An optional behavior that an underlying sink may or may not provide.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    Hijack,
    Flush,
    CloseNotify,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Hijack => "hijack",
            Capability::Flush => "flush",
            Capability::CloseNotify => "close notify",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("underlying sink does not support {capability}")]
    Unsupported { capability: Capability },

    #[error("connection has been hijacked")]
    Hijacked,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl WriterError {
    pub fn unsupported(capability: Capability) -> Self {
        Self::Unsupported { capability }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("wrote more than the declared content-length {declared}")]
    ContentLengthExceeded { declared: u64 },

    #[error("response status does not allow a body")]
    BodyNotAllowed,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn content_length_exceeded(declared: u64) -> Self {
        Self::ContentLengthExceeded { declared }
    }
}

/// Sink writes report failures as `io::Error`, encoding failures ride along as `InvalidInput`.
impl From<SendError> for io::Error {
    fn from(e: SendError) -> Self {
        match e {
            SendError::Io { source } => source,
            other => io::Error::new(io::ErrorKind::InvalidInput, other),
        }
    }
}
