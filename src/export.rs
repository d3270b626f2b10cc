//! Export - downloadable encodings of a result table
//!
//! Payloads are kept in memory and handed out as base64 data URIs;
//! nothing is written to disk and nothing here is read back.

use crate::error::{PinnError, Result};
use crate::table::QueryTable;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rust_xlsxwriter::{Format, Workbook};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const TEXT_MIME: &str = "text/plain";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Xlsx,
}

impl FromStr for ExportFormat {
    type Err = PinnError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "txt" | "text" => Ok(ExportFormat::Text),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            other => Err(PinnError::Export(format!("Unknown export format '{}'", other))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Text => write!(f, "txt"),
            ExportFormat::Xlsx => write!(f, "xlsx"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportPayload {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

pub fn export(table: &QueryTable, format: ExportFormat) -> Result<ExportPayload> {
    match format {
        ExportFormat::Text => Ok(to_text(table)),
        ExportFormat::Xlsx => to_xlsx(table),
    }
}

pub fn to_text(table: &QueryTable) -> ExportPayload {
    ExportPayload {
        file_name: "query_result.txt".to_string(),
        mime_type: TEXT_MIME,
        bytes: table.to_text().into_bytes(),
    }
}

/// Single-sheet workbook: bold header row, one row per result row.
pub fn to_xlsx(table: &QueryTable) -> Result<ExportPayload> {
    let xlsx_err = |e: rust_xlsxwriter::XlsxError| PinnError::Export(e.to_string());

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    for (col, name) in table.columns.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, name, &header)
            .map_err(xlsx_err)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            let col = col as u16;
            match value {
                Value::Null => {}
                Value::Bool(b) => {
                    sheet.write_boolean(r, col, *b).map_err(xlsx_err)?;
                }
                Value::Number(n) => match n.as_f64() {
                    Some(f) => {
                        sheet.write_number(r, col, f).map_err(xlsx_err)?;
                    }
                    None => {
                        sheet.write_string(r, col, n.to_string()).map_err(xlsx_err)?;
                    }
                },
                Value::String(s) => {
                    sheet.write_string(r, col, s).map_err(xlsx_err)?;
                }
                other => {
                    sheet.write_string(r, col, other.to_string()).map_err(xlsx_err)?;
                }
            }
        }
    }

    let bytes = workbook.save_to_buffer().map_err(xlsx_err)?;
    Ok(ExportPayload {
        file_name: "query_result.xlsx".to_string(),
        mime_type: XLSX_MIME,
        bytes,
    })
}
