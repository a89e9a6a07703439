use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde::Serialize;

use crate::account::{Account, industry_is_unset};
use crate::error::{DashboardError, DashboardResult};

/// Bucket name for accounts without a usable industry.
pub const OTHER_INDUSTRY: &str = "Other";

/// How many industry groups the distribution keeps.
pub const TOP_INDUSTRIES: usize = 4;

/// How many of the newest accounts the dashboard lists.
pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    /// Newest entries shown on the dashboard (at most [`RECENT_LIMIT`]).
    pub new_entries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndustryShare {
    pub name: String,
    pub count: usize,
    /// Share of all accounts, rounded to a whole percent.
    pub percent: u32,
}

pub fn summarize(accounts: &[Account]) -> Summary {
    let total = accounts.len();
    let active = accounts.iter().filter(|a| a.is_active()).count();
    Summary {
        total,
        active,
        inactive: total - active,
        new_entries: total.min(RECENT_LIMIT),
    }
}

fn percent_of(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    // Counts are small, the f64 conversion is exact.
    ((part as f64 / total as f64) * 100.0).round() as u32
}

/// `round(active / total * 100)`, or 0 for an empty collection.
pub fn goal_percentage(accounts: &[Account]) -> u32 {
    let summary = summarize(accounts);
    percent_of(summary.active, summary.total)
}

/// Every industry group with its count, in first-seen order.
pub fn industry_counts(accounts: &[Account]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for account in accounts {
        let industry = account.fields.industry.as_str();
        let name = if industry_is_unset(industry) {
            OTHER_INDUSTRY
        } else {
            industry
        };
        match counts.iter_mut().find(|(n, _)| n == name) {
            Some((_, count)) => *count += 1,
            None => counts.push((name.to_string(), 1)),
        }
    }
    counts
}

/// The largest industry groups, biggest first. Ties keep first-seen order.
pub fn industry_distribution(accounts: &[Account]) -> Vec<IndustryShare> {
    let total = accounts.len();
    let mut counts = industry_counts(accounts);
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts
        .into_iter()
        .take(TOP_INDUSTRIES)
        .map(|(name, count)| IndustryShare {
            name,
            count,
            percent: percent_of(count, total),
        })
        .collect()
}

/// The `limit` newest accounts.
pub fn recent_accounts(accounts: &[Account], limit: usize) -> &[Account] {
    &accounts[..accounts.len().min(limit)]
}

/// File name for the report workbook, e.g. `CRM_Report_2024-05-01.xlsx`.
pub fn report_filename(date: chrono::NaiveDate) -> String {
    format!("CRM_Report_{}.xlsx", date.format("%Y-%m-%d"))
}

/// Build the analytics workbook: an executive summary sheet and the
/// industry breakdown.
pub fn report_to_xlsx(accounts: &[Account]) -> DashboardResult<Vec<u8>> {
    build_report(accounts).map_err(|e| DashboardError::Encode(e.to_string()))
}

fn build_report(accounts: &[Account]) -> Result<Vec<u8>, rust_xlsxwriter::XlsxError> {
    let summary = summarize(accounts);
    let bold = Format::new().set_bold();

    let mut workbook = Workbook::new();

    let mut overview = Worksheet::new();
    overview.set_name("Executive Summary")?;
    overview.write_string_with_format(0, 0, "Metric", &bold)?;
    overview.write_string_with_format(0, 1, "Value", &bold)?;
    let metrics = [
        ("Total Accounts", summary.total),
        ("Active Projects", summary.active),
        ("Pending Audits", summary.inactive),
    ];
    for (row, (label, value)) in metrics.iter().enumerate() {
        let row = row as u32 + 1;
        overview.write_string(row, 0, *label)?;
        overview.write_number(row, 1, *value as f64)?;
    }
    workbook.push_worksheet(overview);

    let mut breakdown = Worksheet::new();
    breakdown.set_name("Industry Breakdown")?;
    breakdown.write_string_with_format(0, 0, "Industry", &bold)?;
    breakdown.write_string_with_format(0, 1, "Account Count", &bold)?;
    for (row, share) in industry_distribution(accounts).iter().enumerate() {
        let row = row as u32 + 1;
        breakdown.write_string(row, 0, share.name.as_str())?;
        breakdown.write_number(row, 1, share.count as f64)?;
    }
    workbook.push_worksheet(breakdown);

    workbook.save_to_buffer()
}
