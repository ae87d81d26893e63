//! Handler return value conversion.

use crate::error::BoxError;

/// Converts a handler's return value into success or a fault.
///
/// # Default Implementations
///
/// - `()` → success
/// - `Result<T, E>` → delegates to `T`, or the error becomes a fault
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be returned from a handler",
    label = "missing `IntoOutcome` implementation",
    note = "Handlers return `()` or `Result<(), E>` where `E` converts into `BoxError`."
)]
pub trait IntoOutcome {
    /// Convert the output into success or the handler's fault.
    fn into_outcome(self) -> Result<(), BoxError>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoOutcome,
    E: Into<BoxError>,
{
    fn into_outcome(self) -> Result<(), BoxError> {
        match self {
            Ok(t) => t.into_outcome(),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_and_ok_succeed() {
        assert!(().into_outcome().is_ok());
        assert!(Ok::<(), std::io::Error>(()).into_outcome().is_ok());
    }

    #[test]
    fn errors_become_faults() {
        let err = Err::<(), _>("boom").into_outcome().unwrap_err();
        assert_eq!(err.to_string(), "boom");

        let io = Err::<(), _>(std::io::Error::other("disk")).into_outcome();
        assert_eq!(io.unwrap_err().to_string(), "disk");
    }
}
