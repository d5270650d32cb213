use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathSpiceError {
    #[error("cannot open {} for writing: {source}", .path.display())]
    FileNotWritable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot open {} for reading: {source}", .path.display())]
    FileNotReadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("spice subckt for cell {cell} missing .ends in {}", .path.display())]
    SubcktEndsMissing { cell: String, path: PathBuf },

    #[error("subckts missing from {}: {}", .path.display(), .cells.join(" "))]
    MissingSubckts { path: PathBuf, cells: Vec<String> },

    #[error("pg_pin {cell}/{port} voltage {voltage_name} not found")]
    PgVoltageUnresolved {
        cell: String,
        port: String,
        voltage_name: String,
    },

    #[error("pg_pin {cell}/{port} missing voltage_name attribute")]
    PgVoltageNameMissing { cell: String, port: String },

    #[error("cell {cell} pg_port {port} not found")]
    PgPortMissing { cell: String, port: String },

    #[error(
        "subckt {cell} port {port} has no corresponding liberty port or pg_port \
         and is not power or ground"
    )]
    SubcktPortUnmapped { cell: String, port: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PathSpiceError>;
