use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::account::{Account, AccountId};
use crate::error::{DashboardError, DashboardResult};
use crate::form::RecordForm;
use crate::store::AccountStore;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Sortable / searchable table columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Name,
    Email,
    Phone,
    Website,
    Industry,
    Status,
    Remark,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::Name,
        Column::Email,
        Column::Phone,
        Column::Website,
        Column::Industry,
        Column::Status,
        Column::Remark,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Column::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(name.trim()))
    }

    pub fn key(self) -> &'static str {
        match self {
            Column::Name => "name",
            Column::Email => "email",
            Column::Phone => "phone",
            Column::Website => "website",
            Column::Industry => "industry",
            Column::Status => "status",
            Column::Remark => "remark",
        }
    }

    /// The cell text for this column, as displayed.
    pub fn value(self, account: &Account) -> &str {
        let f = &account.fields;
        match self {
            Column::Name => f.name.as_str(),
            Column::Email => f.email.as_str(),
            Column::Phone => f.phone.as_str(),
            Column::Website => f.website.as_str(),
            Column::Industry => f.industry.as_str(),
            Column::Status => account.status_label(),
            Column::Remark => f.remark.as_str(),
        }
    }

    fn compare(self, a: &Account, b: &Account) -> Ordering {
        match self {
            Column::Status => a.fields.status.cmp(&b.fields.status),
            _ => self
                .value(a)
                .to_lowercase()
                .cmp(&self.value(b).to_lowercase()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// Filter, sort and page position of the account table.
///
/// Rows are never cached: every query runs against the full collection
/// passed in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableState {
    filter: String,
    sort: Option<(Column, SortDirection)>,
    page: usize,
    page_size: usize,
}

impl Default for TableState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl TableState {
    pub fn new(page_size: usize) -> Self {
        TableState {
            filter: String::new(),
            sort: None,
            page: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Page index is left alone, even if it now points past the end.
    pub fn set_filter(&mut self, query: impl Into<String>) {
        self.filter = query.into();
    }

    pub fn sort(&self) -> Option<(Column, SortDirection)> {
        self.sort
    }

    pub fn set_sort(&mut self, column: Column, direction: SortDirection) {
        self.sort = Some((column, direction));
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
    }

    /// Cycle a column through ascending, descending and unsorted.
    pub fn toggle_sort(&mut self, column: Column) {
        self.sort = match self.sort {
            Some((c, SortDirection::Asc)) if c == column => Some((column, SortDirection::Desc)),
            Some((c, SortDirection::Desc)) if c == column => None,
            _ => Some((column, SortDirection::Asc)),
        };
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    pub fn next_page(&mut self, accounts: &[Account]) {
        if self.page.saturating_add(1) < self.page_count(accounts) {
            self.page += 1;
        }
    }

    pub fn previous_page(&mut self) {
        self.page = self.page.saturating_sub(1);
    }

    fn matches(&self, account: &Account) -> bool {
        if self.filter.is_empty() {
            return true;
        }
        let needle = self.filter.to_lowercase();
        Column::ALL
            .iter()
            .any(|c| c.value(account).to_lowercase().contains(&needle))
    }

    /// Rows that pass the filter, in display order.
    pub fn filtered_rows<'a>(&self, accounts: &'a [Account]) -> Vec<&'a Account> {
        let mut rows: Vec<&Account> = accounts.iter().filter(|a| self.matches(a)).collect();
        if let Some((column, direction)) = self.sort {
            rows.sort_by(|a, b| {
                let ord = column.compare(a, b);
                match direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }
        rows
    }

    pub fn page_count(&self, accounts: &[Account]) -> usize {
        self.filtered_rows(accounts).len().div_ceil(self.page_size)
    }

    /// The rows on the current page after filtering and sorting.
    pub fn visible_rows<'a>(&self, accounts: &'a [Account]) -> Vec<&'a Account> {
        self.filtered_rows(accounts)
            .into_iter()
            .skip(self.page.saturating_mul(self.page_size))
            .take(self.page_size)
            .collect()
    }

    /// Open the record form in edit mode for `account`.
    pub fn edit(&self, account: &Account) -> RecordForm {
        RecordForm::edit(account)
    }

    /// First step of a delete. Nothing happens until the returned value is
    /// confirmed.
    pub fn request_delete(&self, id: AccountId) -> PendingDelete {
        PendingDelete { id }
    }

    /// Resolve an export choice to the rows that go into the file.
    ///
    /// # Arguments
    /// * `accounts` - The full collection in store order
    /// * `selection` - Current page (filtered and sorted), everything, or a
    ///   1-based inclusive range over the unfiltered collection
    ///
    /// # Returns
    /// * `DashboardResult<Vec<&Account>>` - The rows in export order, or
    ///   `InvalidRange` when the range does not fit the collection
    pub fn select_for_export<'a>(
        &self,
        accounts: &'a [Account],
        selection: &ExportSelection,
    ) -> DashboardResult<Vec<&'a Account>> {
        match *selection {
            ExportSelection::CurrentPage => Ok(self.visible_rows(accounts)),
            ExportSelection::All => Ok(accounts.iter().collect()),
            ExportSelection::Range { start, end } => {
                if start < 1 || start > end || end > accounts.len() {
                    return Err(DashboardError::InvalidRange {
                        input: format!("{start}-{end}"),
                        total: accounts.len(),
                    });
                }
                Ok(accounts[start - 1..end].iter().collect())
            }
        }
    }
}

/// A delete the user has asked for but not yet confirmed.
#[must_use = "a pending delete does nothing until confirmed"]
#[derive(Debug, PartialEq, Eq)]
pub struct PendingDelete {
    id: AccountId,
}

impl PendingDelete {
    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn confirm(self, store: &mut AccountStore) -> bool {
        store.delete(self.id)
    }

    pub fn cancel(self) {}
}

/// Which rows an export covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportSelection {
    /// Rows visible on the current page.
    CurrentPage,
    /// The whole unfiltered collection.
    All,
    /// 1-based inclusive positions in the unfiltered collection.
    Range { start: usize, end: usize },
}

impl ExportSelection {
    /// Label used in the export file name.
    pub fn label(&self) -> String {
        match self {
            ExportSelection::CurrentPage => "Current_Page".to_string(),
            ExportSelection::All => "All_Records".to_string(),
            ExportSelection::Range { start, end } => format!("Range_{start}-{end}"),
        }
    }
}

/// Parse user input such as `"1-10"` into a range selection, checked
/// against a collection of `total` records.
pub fn parse_range(input: &str, total: usize) -> DashboardResult<ExportSelection> {
    let invalid = || DashboardError::InvalidRange {
        input: input.to_string(),
        total,
    };

    let (start, end) = input.split_once('-').ok_or_else(invalid)?;
    let start: usize = start.trim().parse().map_err(|_| invalid())?;
    let end: usize = end.trim().parse().map_err(|_| invalid())?;

    if start < 1 || start > end || end > total {
        return Err(invalid());
    }
    Ok(ExportSelection::Range { start, end })
}
