use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde::Serialize;

use crate::account::Account;
use crate::error::{DashboardError, DashboardResult};

/// Column headers written to every export, in order.
pub const EXPORT_HEADERS: [&str; 7] = [
    "Account Name",
    "Email Address",
    "Phone Number",
    "Website",
    "Industry",
    "Status",
    "Remarks",
];

pub const EXPORT_SHEET: &str = "Accounts";

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// An account as it appears in an export: no id, status spelled out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub website: &'a str,
    pub industry: &'a str,
    pub status: &'static str,
    pub remark: &'a str,
}

impl<'a> ExportRow<'a> {
    pub fn from_account(account: &'a Account) -> Self {
        let f = &account.fields;
        ExportRow {
            name: &f.name,
            email: &f.email,
            phone: &f.phone,
            website: &f.website,
            industry: &f.industry,
            status: account.status_label(),
            remark: &f.remark,
        }
    }

    fn cells(&self) -> [&str; 7] {
        [
            self.name,
            self.email,
            self.phone,
            self.website,
            self.industry,
            self.status,
            self.remark,
        ]
    }
}

/// A generated file ready to download.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// File name for an account export, e.g. `Account_Report_All_Records_2024-05-01.xlsx`.
pub fn export_filename(label: &str, date: chrono::NaiveDate) -> String {
    format!("Account_Report_{label}_{}.xlsx", date.format("%Y-%m-%d"))
}

fn rows_for<'a>(accounts: &[&'a Account]) -> DashboardResult<Vec<ExportRow<'a>>> {
    if accounts.is_empty() {
        return Err(DashboardError::NothingToExport);
    }
    Ok(accounts.iter().map(|a| ExportRow::from_account(*a)).collect())
}

/// Render the selected accounts as an XLSX workbook.
///
/// # Arguments
/// * `accounts` - Rows to export, in order
/// * `label` - Selection label used in the file name (`All_Records`, `Range_3-7`, ...)
/// * `date` - Date stamp for the file name
pub fn to_xlsx(
    accounts: &[&Account],
    label: &str,
    date: chrono::NaiveDate,
) -> DashboardResult<ExportFile> {
    let rows = rows_for(accounts)?;
    let bytes = write_workbook(&rows).map_err(|e| DashboardError::Encode(e.to_string()))?;
    log::info!("Exported {} accounts as {label}", rows.len());

    Ok(ExportFile {
        filename: export_filename(label, date),
        bytes,
    })
}

fn write_workbook(rows: &[ExportRow<'_>]) -> Result<Vec<u8>, rust_xlsxwriter::XlsxError> {
    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name(EXPORT_SHEET)?;

    let bold = Format::new().set_bold();
    for (c, header) in EXPORT_HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, c as u16, *header, &bold)?;
    }

    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.cells().iter().enumerate() {
            worksheet.write_string(r as u32 + 1, c as u16, *value)?;
        }
    }

    workbook.push_worksheet(worksheet);
    workbook.save_to_buffer()
}

/// Render the selected accounts as CSV with the export headers.
pub fn to_csv(accounts: &[&Account]) -> DashboardResult<String> {
    let rows = rows_for(accounts)?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(EXPORT_HEADERS)
        .map_err(|e| DashboardError::Encode(e.to_string()))?;
    for row in &rows {
        writer
            .write_record(row.cells())
            .map_err(|e| DashboardError::Encode(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DashboardError::Encode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| DashboardError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::seed_accounts;
    use crate::loader::{ImportFormat, decode};

    fn date() -> chrono::NaiveDate {
        chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn empty_selection_produces_no_file() {
        assert!(matches!(
            to_xlsx(&[], "All_Records", date()),
            Err(DashboardError::NothingToExport)
        ));
        assert!(matches!(to_csv(&[]), Err(DashboardError::NothingToExport)));
    }

    #[test]
    fn xlsx_export_is_named_and_decodable() {
        let accounts = seed_accounts();
        let selected: Vec<&Account> = accounts.iter().take(3).collect();

        let file = to_xlsx(&selected, "Range_1-3", date()).unwrap();
        assert_eq!(file.filename, "Account_Report_Range_1-3_2024-05-01.xlsx");

        // Only Website and Industry share a header with the import format.
        let rows = decode(&file.bytes, ImportFormat::Xlsx).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].website.as_deref(), Some("http://fc2.com"));
        assert_eq!(rows[1].industry.as_deref(), Some("Real Estate"));
        assert_eq!(rows[0].name, None);
    }

    #[test]
    fn csv_export_has_labels_and_no_id() {
        let accounts = seed_accounts();
        let selected: Vec<&Account> = accounts.iter().skip(1).take(1).collect();

        let csv = to_csv(&selected).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Account Name,Email Address,Phone Number,Website,Industry,Status,Remarks")
        );
        assert_eq!(
            lines.next(),
            Some("Aloysius,amellanby1@lycos.com,4988111631,http://sun.com,Real Estate,Inactive,nulla nisl nunc")
        );
        assert_eq!(lines.next(), None);
    }
}
