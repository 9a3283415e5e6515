//! CLI Exit Code Registry
//!
//! Single source of truth for `fleetmatch` exit codes. Scripts rely on them.
//!
//! | Range   | Domain    | Description                              |
//! |---------|-----------|------------------------------------------|
//! | 0       | Universal | Success (matches found or not)           |
//! | 2       | Universal | Usage error (bad args, tolerance range)  |
//! | 60-69   | recon     | Config, schema and runtime failures      |

use fleetmatch_recon::ReconError;

// =============================================================================
// Universal (0, 2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, tolerance outside [0, 24].
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Recon (60-69)
// =============================================================================

/// Config file failed to parse or validate.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 60;

/// A ledger file lacks one or more mapped columns.
pub const EXIT_RECON_SCHEMA: u8 = 61;

/// IO or CSV decoding failure while reading or writing files.
pub const EXIT_RECON_RUNTIME: u8 = 62;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_)
        | ReconError::ConfigValidation(_)
        | ReconError::ToleranceOutOfRange(_) => EXIT_RECON_INVALID_CONFIG,
        ReconError::Schema { .. } => EXIT_RECON_SCHEMA,
        ReconError::Csv(_) | ReconError::Io(_) => EXIT_RECON_RUNTIME,
    }
}
