//! Exit code constants for the `its` CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, unreadable files, invalid configuration)
//! - 2: Validation failure (structure, variable references)
//! - 3: Security violation
//! - 4: Compilation failure (unknown instruction type, resolution, schema load)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, unreadable input, or invalid configuration.
pub const USER_ERROR: i32 = 1;

/// Validation failure: the template is structurally invalid.
pub const VALIDATION_FAILURE: i32 = 2;

/// Security violation: the template or a schema URL was rejected.
pub const SECURITY_VIOLATION: i32 = 3;

/// Compilation failure: a pipeline stage could not complete.
pub const COMPILATION_FAILURE: i32 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            SUCCESS,
            USER_ERROR,
            VALIDATION_FAILURE,
            SECURITY_VIOLATION,
            COMPILATION_FAILURE,
        ];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }
}
