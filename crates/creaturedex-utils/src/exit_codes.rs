//! Exit code constants for creaturedex.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments, configuration, or input |
//! | 3 | `NO_CREATURE` | No animal or sea creature recognized |
//! | 4 | `CONFLICT` | Creature already exists |
//! | 5 | `NOT_FOUND` | Creature not found |
//! | 10 | `ORACLE_TIMEOUT` | Model call timed out |
//! | 70 | `ORACLE_FAILURE` | Model call failed |

/// Exit codes matching the documented exit code table.
///
/// Use the named constants for common exit codes, or [`as_i32()`](Self::as_i32)
/// to get the numeric value for `std::process::exit()`.
///
/// ```rust
/// use creaturedex_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::NO_CREATURE, ExitCode::from_i32(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - operation completed successfully
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments, configuration, or empty input
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// No creature - the scan completed but found no animal or sea creature
    pub const NO_CREATURE: ExitCode = ExitCode(3);

    /// Conflict - a creature with the same name or scientific name exists
    pub const CONFLICT: ExitCode = ExitCode(4);

    /// Not found - no creature with the requested id
    pub const NOT_FOUND: ExitCode = ExitCode(5);

    /// Oracle timeout - a model call exceeded its timeout
    pub const ORACLE_TIMEOUT: ExitCode = ExitCode(10);

    /// Oracle failure - transport, provider, or response-shape failure
    pub const ORACLE_FAILURE: ExitCode = ExitCode(70);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    ///
    /// Prefer using the named constants when possible.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values_are_stable() {
        assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
        assert_eq!(ExitCode::INTERNAL.as_i32(), 1);
        assert_eq!(ExitCode::CLI_ARGS.as_i32(), 2);
        assert_eq!(ExitCode::NO_CREATURE.as_i32(), 3);
        assert_eq!(ExitCode::CONFLICT.as_i32(), 4);
        assert_eq!(ExitCode::NOT_FOUND.as_i32(), 5);
        assert_eq!(ExitCode::ORACLE_TIMEOUT.as_i32(), 10);
        assert_eq!(ExitCode::ORACLE_FAILURE.as_i32(), 70);
    }

    #[test]
    fn test_i32_conversions_round_trip() {
        let code: ExitCode = 4.into();
        assert_eq!(code, ExitCode::CONFLICT);
        assert_eq!(i32::from(ExitCode::ORACLE_FAILURE), 70);
    }
}
