//! Error adapter for converting FleetmapError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI. Malformed
//! inventory files are rendered with a snippet pointing at the offending
//! line and column.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use fleetmap::FleetmapError;

/// Adapter for [`FleetmapError::Inventory`], carrying the decoded source.
pub struct InventoryAdapter<'a> {
    message: String,
    src: &'a str,
    span: SourceSpan,
}

impl<'a> InventoryAdapter<'a> {
    /// Create an adapter for a decode error reported at `line`/`column`
    /// (both 1-based) of `src`.
    pub fn new(message: String, src: &'a str, line: usize, column: usize) -> Self {
        let offset = line_column_to_offset(src, line, column);
        let len = usize::from(offset < src.len());
        Self {
            message,
            src,
            span: SourceSpan::new(offset.into(), len),
        }
    }

    pub fn span(&self) -> SourceSpan {
        self.span
    }
}

impl fmt::Debug for InventoryAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InventoryAdapter")
            .field("message", &self.message)
            .field("span", &self.span)
            .finish()
    }
}

impl fmt::Display for InventoryAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid inventory: {}", self.message)
    }
}

impl std::error::Error for InventoryAdapter<'_> {}

impl MietteDiagnostic for InventoryAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("fleetmap::inventory"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(
            "expected an object with `nodes`, `lookups` and `config` entries",
        ))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(
            LabeledSpan::new_primary_with_span(Some("here".to_string()), self.span),
        )))
    }
}

/// Adapter for [`FleetmapError`] variants without source information.
pub struct ErrorAdapter<'a>(pub &'a FleetmapError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            FleetmapError::Io(_) => "fleetmap::io",
            FleetmapError::Inventory { .. } => "fleetmap::inventory",
            FleetmapError::Config(_) => "fleetmap::config",
            FleetmapError::Export(_) => "fleetmap::export",
        };
        Some(Box::new(code))
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A decode error with source location information.
    Inventory(InventoryAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Inventory(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Inventory(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Inventory(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Inventory(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Inventory(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Inventory(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Byte offset of a 1-based `line`/`column` position, clamped to `src`.
fn line_column_to_offset(src: &str, line: usize, column: usize) -> usize {
    let line_start: usize = src
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(src.len())
}

/// Convert a [`FleetmapError`] into a list of reportable errors.
pub fn to_reportables(err: &FleetmapError) -> Vec<Reportable<'_>> {
    match err {
        FleetmapError::Inventory { err: json_err, src } => {
            vec![Reportable::Inventory(InventoryAdapter::new(
                json_err.to_string(),
                src,
                json_err.line(),
                json_err.column(),
            ))]
        }
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}
