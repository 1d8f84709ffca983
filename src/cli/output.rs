use crate::domain::error::XenError;
use crate::domain::inventory::InventoryDocument;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::{self, Write};

/// Output writer trait for the tools' results
pub trait OutputWriter {
    fn write_inventory(&self, inventory: &InventoryDocument) -> Result<(), OutputError>;
    fn write_host_vars(&self, vars: &Map<String, Value>) -> Result<(), OutputError>;
    fn write_error(&self, error: &str) -> Result<(), OutputError>;
}

/// Output formatting errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl From<OutputError> for XenError {
    fn from(err: OutputError) -> Self {
        Self::Output(err.to_string())
    }
}

/// How a tool labels failed operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStyle {
    /// `[ERROR]: message`
    Tag,
    /// `[Error] : message`
    Inventory,
}

impl ErrorStyle {
    fn prefix(&self) -> &'static str {
        match self {
            ErrorStyle::Tag => "[ERROR]: ",
            ErrorStyle::Inventory => "[Error] : ",
        }
    }
}

/// Diagnostic line for a failed run. Connection and configuration problems
/// carry their own wording; failed operations get the tool's prefix.
pub fn failure_message(style: ErrorStyle, error: &XenError) -> String {
    match error {
        XenError::Connection { .. }
        | XenError::Authentication { .. }
        | XenError::Config { .. }
        | XenError::CacheDirectory { .. } => error.to_string(),
        _ => format!("{}{}", style.prefix(), error),
    }
}

/// Pretty JSON with two-space indentation
pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String, OutputError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Console output writer: documents to stdout, errors to stderr
#[derive(Debug, Default)]
pub struct ConsoleWriter;

impl ConsoleWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_failure(&self, style: ErrorStyle, error: &XenError) -> Result<(), OutputError> {
        self.write_error(&failure_message(style, error))
    }

    fn write_stdout(&self, text: &str) -> Result<(), OutputError> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", text)?;
        stdout.flush()?;
        Ok(())
    }
}

impl OutputWriter for ConsoleWriter {
    fn write_inventory(&self, inventory: &InventoryDocument) -> Result<(), OutputError> {
        self.write_stdout(&render_json(inventory)?)
    }

    fn write_host_vars(&self, vars: &Map<String, Value>) -> Result<(), OutputError> {
        self.write_stdout(&render_json(vars)?)
    }

    fn write_error(&self, error: &str) -> Result<(), OutputError> {
        let mut stderr = io::stderr().lock();
        writeln!(stderr, "{}", error)?;
        Ok(())
    }
}
