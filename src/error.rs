//! Error types shared by every encoder and sink.

use std::io;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required field was never set.
    Configuration,
    /// A value does not fit the field it was written to.
    ValueRange,
    /// The transmission sink failed.
    Transmission,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{field} must be set before packing")]
    MissingField { field: &'static str },

    #[error("{field} value {value} exceeds maximum {max}")]
    OutOfRange {
        field: &'static str,
        value: String,
        max: u64,
    },

    #[error("invalid IPv4 address: {0:?}")]
    InvalidAddress(String),

    #[error("unknown {field} value {value}")]
    UnknownValue { field: &'static str, value: u8 },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingField { .. } => ErrorKind::Configuration,
            Error::OutOfRange { .. } | Error::InvalidAddress(_) | Error::UnknownValue { .. } => {
                ErrorKind::ValueRange
            }
            Error::Io(_) => ErrorKind::Transmission,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Narrow `value` into `T`, reporting `field` if it does not fit.
pub(crate) fn narrow<T, V>(field: &'static str, value: V, max: u64) -> Result<T>
where
    V: TryInto<T> + Copy + std::fmt::Display,
{
    value.try_into().map_err(|_| Error::OutOfRange {
        field,
        value: value.to_string(),
        max,
    })
}

/// Reject `value` if it needs more than `bits` bits.
pub(crate) fn check_width(field: &'static str, value: u64, bits: u32) -> Result<()> {
    let max = (1u64 << bits) - 1;
    if value > max {
        return Err(Error::OutOfRange {
            field,
            value: value.to_string(),
            max,
        });
    }
    Ok(())
}
