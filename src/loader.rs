use calamine::{Data, ExcelDateTime, Reader, Xlsx, open_workbook_from_rs};
use serde::Serialize;
use std::io::Cursor;
use std::path::Path;

use crate::account::{AccountFields, AccountId, INDUSTRY_UNSET};
use crate::error::{DashboardError, DashboardResult};
use crate::store::AccountStore;

/// Column headers an import file may carry. Matched case-insensitively.
pub const IMPORT_HEADERS: [&str; 6] = ["Name", "Email", "Phone", "Website", "Industry", "Remark"];

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportFormat {
    Csv,
    Xlsx,
}

impl ImportFormat {
    /// Detect the format from a file name's extension.
    pub fn from_path(path: impl AsRef<Path>) -> DashboardResult<Self> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(ImportFormat::Csv),
            Some("xlsx") => Ok(ImportFormat::Xlsx),
            Some(ext) => Err(DashboardError::UnsupportedFormat(ext.to_string())),
            None => Err(DashboardError::UnsupportedFormat(
                "file has no extension".to_string(),
            )),
        }
    }

    pub fn from_mime(mime: &str) -> DashboardResult<Self> {
        match mime.trim().to_lowercase().as_str() {
            "text/csv" => Ok(ImportFormat::Csv),
            XLSX_MIME => Ok(ImportFormat::Xlsx),
            other => Err(DashboardError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// One decoded data row. `None` means the column was absent or blank.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportRow {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub remark: Option<String>,
}

impl ImportRow {
    fn from_cells(columns: &[Option<usize>; 6], cells: &[String]) -> Self {
        let cell = |slot: usize| {
            columns[slot]
                .and_then(|i| cells.get(i))
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        ImportRow {
            name: cell(0),
            email: cell(1),
            phone: cell(2),
            website: cell(3),
            industry: cell(4),
            remark: cell(5),
        }
    }

    /// Fill the gaps with placeholders. Imported accounts are always active.
    pub fn into_fields(self) -> AccountFields {
        AccountFields {
            name: self.name.unwrap_or_else(|| "Unknown".to_string()),
            email: self.email.unwrap_or_else(|| "N/A".to_string()),
            phone: self.phone.unwrap_or_else(|| "N/A".to_string()),
            website: self.website.unwrap_or_else(|| "N/A".to_string()),
            industry: self.industry.unwrap_or_else(|| INDUSTRY_UNSET.to_string()),
            status: true,
            remark: self.remark.unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub created: Vec<AccountId>,
}

impl ImportReport {
    pub fn count(&self) -> usize {
        self.created.len()
    }
}

/// Map each recognised header to its column position.
fn header_positions(headers: &[String]) -> [Option<usize>; 6] {
    let mut positions = [None; 6];
    for (slot, wanted) in IMPORT_HEADERS.iter().enumerate() {
        positions[slot] = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(wanted));
    }
    positions
}

fn is_blank(cells: &[String]) -> bool {
    cells.iter().all(|c| c.trim().is_empty())
}

fn decode_csv(bytes: &[u8]) -> DashboardResult<Vec<ImportRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| DashboardError::Decode(e.to_string()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let columns = header_positions(&headers);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DashboardError::Decode(e.to_string()))?;
        let cells: Vec<String> = record.iter().map(str::to_string).collect();
        if !is_blank(&cells) {
            rows.push(ImportRow::from_cells(&columns, &cells));
        }
    }
    Ok(rows)
}

/// Dates come back as `YYYY-MM-DD`, with the time appended only when set.
fn datetime_to_string(dt: &ExcelDateTime) -> String {
    match dt.as_datetime() {
        Some(value) if dt.is_datetime() => {
            if value.time() == chrono::NaiveTime::MIN {
                value.format("%Y-%m-%d").to_string()
            } else {
                value.format("%Y-%m-%d %H:%M:%S").to_string()
            }
        }
        _ => dt.to_string(),
    }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => datetime_to_string(dt),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}

fn decode_xlsx(bytes: &[u8]) -> DashboardResult<Vec<ImportRow>> {
    let mut workbook = open_workbook_from_rs::<Xlsx<_>, _>(Cursor::new(bytes))
        .map_err(|e| DashboardError::Decode(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| DashboardError::Decode("workbook has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| DashboardError::Decode(e.to_string()))?;

    let mut lines = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<String>>());

    let Some(headers) = lines.next() else {
        return Ok(Vec::new());
    };
    let columns = header_positions(&headers);

    Ok(lines
        .filter(|cells| !is_blank(cells))
        .map(|cells| ImportRow::from_cells(&columns, &cells))
        .collect())
}

/// Decode an uploaded file into rows. Only the first worksheet of a
/// workbook is read.
pub fn decode(bytes: &[u8], format: ImportFormat) -> DashboardResult<Vec<ImportRow>> {
    match format {
        ImportFormat::Csv => decode_csv(bytes),
        ImportFormat::Xlsx => decode_xlsx(bytes),
    }
}

/// Reject uploads over `limit` bytes.
pub fn check_size(bytes: &[u8], limit: usize) -> DashboardResult<()> {
    if bytes.len() > limit {
        return Err(DashboardError::FileTooLarge {
            size: bytes.len(),
            limit,
        });
    }
    Ok(())
}

/// Decode `bytes` and create one account per row.
///
/// Rows are created one at a time with no rollback and no duplicate
/// detection; importing the same file twice yields two sets of accounts.
///
/// # Arguments
/// * `store` - Store receiving the new accounts
/// * `bytes` - Raw upload contents
/// * `format` - How to decode `bytes`
///
/// # Returns
/// * `DashboardResult<ImportReport>` - Ids of the created accounts, or
///   `EmptyImport` when no data rows were found
pub fn import_accounts(
    store: &mut AccountStore,
    bytes: &[u8],
    format: ImportFormat,
) -> DashboardResult<ImportReport> {
    let rows = decode(bytes, format)?;
    if rows.is_empty() {
        return Err(DashboardError::EmptyImport);
    }

    let mut report = ImportReport::default();
    for row in rows {
        report.created.push(store.create(row.into_fields()));
    }
    log::info!("Imported {} accounts", report.count());
    Ok(report)
}

/// Header-only CSV users can download and fill in.
pub fn template_csv() -> String {
    format!("{}\n", IMPORT_HEADERS.join(","))
}
