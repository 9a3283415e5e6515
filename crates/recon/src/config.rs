use serde::Deserialize;

use crate::error::ReconError;
use crate::model::{LedgerSide, MatchTolerance};
use crate::normalize::DEFAULT_TIMESTAMP_FORMAT;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub ledger_a: LedgerConfig,
    pub ledger_b: LedgerConfig,
    #[serde(default)]
    pub tolerance: ToleranceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_name() -> String {
    "fleetmatch".into()
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    pub file: String,
    /// Falls back to the side's default header names when omitted.
    #[serde(default)]
    pub columns: Option<ColumnMapping>,
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

fn default_timestamp_format() -> String {
    DEFAULT_TIMESTAMP_FORMAT.into()
}

impl LedgerConfig {
    /// A ledger read from `file` with the side's default column names.
    pub fn with_defaults(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            columns: None,
            timestamp_format: default_timestamp_format(),
        }
    }

    pub fn resolved_columns(&self, side: LedgerSide) -> ColumnMapping {
        self.columns
            .clone()
            .unwrap_or_else(|| ColumnMapping::default_for(side))
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColumnMapping {
    pub timestamp: String,
    pub amount: String,
    pub vehicle_id: String,
}

impl ColumnMapping {
    /// Header names of the fuel-card issuer's transaction listing.
    pub fn ledger_a() -> Self {
        Self {
            timestamp: "Date Time".into(),
            amount: "Transaction Amount (RM)".into(),
            vehicle_id: "Vehicle Number".into(),
        }
    }

    /// Header names of the toll/payment processor's export.
    pub fn ledger_b() -> Self {
        Self {
            timestamp: "TransactionDateTime".into(),
            amount: "Amount".into(),
            vehicle_id: "VehicleRegistrationNo".into(),
        }
    }

    pub fn default_for(side: LedgerSide) -> Self {
        match side {
            LedgerSide::A => Self::ledger_a(),
            LedgerSide::B => Self::ledger_b(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tolerance + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ToleranceConfig {
    #[serde(default = "default_hours")]
    pub hours: f64,
}

fn default_hours() -> f64 {
    MatchTolerance::DEFAULT_HOURS
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            hours: default_hours(),
        }
    }
}

impl ToleranceConfig {
    pub fn to_tolerance(&self) -> Result<MatchTolerance, ReconError> {
        MatchTolerance::from_hours(self.hours)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub matched_csv: Option<String>,
    #[serde(default)]
    pub flagged_csv: Option<String>,
    #[serde(default)]
    pub json: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Config for two files with default columns and the given tolerance.
    pub fn for_files(
        ledger_a: impl Into<String>,
        ledger_b: impl Into<String>,
        hours: f64,
    ) -> Self {
        Self {
            name: default_name(),
            ledger_a: LedgerConfig::with_defaults(ledger_a),
            ledger_b: LedgerConfig::with_defaults(ledger_b),
            tolerance: ToleranceConfig { hours },
            output: OutputConfig::default(),
        }
    }

    pub fn ledger(&self, side: LedgerSide) -> &LedgerConfig {
        match side {
            LedgerSide::A => &self.ledger_a,
            LedgerSide::B => &self.ledger_b,
        }
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        self.tolerance.to_tolerance()?;

        for side in [LedgerSide::A, LedgerSide::B] {
            let ledger = self.ledger(side);
            if ledger.file.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "{side}: file must not be empty"
                )));
            }
            if ledger.timestamp_format.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "{side}: timestamp_format must not be empty"
                )));
            }
            let cols = ledger.resolved_columns(side);
            for (field, name) in [
                ("timestamp", &cols.timestamp),
                ("amount", &cols.amount),
                ("vehicle_id", &cols.vehicle_id),
            ] {
                if name.is_empty() {
                    return Err(ReconError::ConfigValidation(format!(
                        "{side}: column '{field}' must not be empty"
                    )));
                }
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
