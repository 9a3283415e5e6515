use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty column name, missing file, etc.).
    ConfigValidation(String),
    /// Time tolerance outside the accepted [0, 24] hour range.
    ToleranceOutOfRange(f64),
    /// One or more mapped columns are absent from a ledger's header row.
    Schema { ledger: String, missing: Vec<String> },
    /// CSV decoding error.
    Csv(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::ToleranceOutOfRange(hours) => {
                write!(f, "tolerance must be between 0 and 24 hours, got {hours}")
            }
            Self::Schema { ledger, missing } => {
                let cols: Vec<String> = missing.iter().map(|c| format!("'{c}'")).collect();
                let noun = if missing.len() == 1 { "column" } else { "columns" };
                write!(f, "ledger '{ledger}': missing {noun} {}", cols.join(", "))
            }
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

impl From<csv::Error> for ReconError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}

impl From<std::io::Error> for ReconError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
