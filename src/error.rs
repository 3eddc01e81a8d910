use std::collections::TryReserveError;
use std::fmt;
pub use Error::*;

/// Error codes
#[non_exhaustive]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// Function called with invalid arguments, e.g. color precision outside `1..=256`
    ValueOutOfRange = 100,
    /// Either the system/process really hit a limit, or the image size was ridiculously wrong
    OutOfMemory,
    /// String is not a `#rgb`, `#rrggbb` or `#rrggbbaa` hex color
    InvalidColor,
    /// Some terrible inconsistency happened
    InternalError,
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    #[cold]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Self::ValueOutOfRange => "VALUE_OUT_OF_RANGE",
            Self::OutOfMemory => "OUT_OF_MEMORY",
            Self::InvalidColor => "INVALID_COLOR",
            Self::InternalError => "INTERNAL_ERROR",
        })
    }
}

impl From<TryReserveError> for Error {
    #[cold]
    fn from(_: TryReserveError) -> Self {
        Self::OutOfMemory
    }
}

#[test]
fn display_codes() {
    assert_eq!("VALUE_OUT_OF_RANGE", ValueOutOfRange.to_string());
    assert_eq!("INVALID_COLOR", InvalidColor.to_string());

    let err = Vec::<u64>::new().try_reserve(usize::MAX).unwrap_err();
    assert_eq!(OutOfMemory, Error::from(err));
}
