use std::sync::Arc;

use account_dashboard::browser::{Column, ExportSelection, SortDirection, TableState, parse_range};
use account_dashboard::downloader;
use account_dashboard::error::DashboardError;
use account_dashboard::form::{FormValues, RecordForm, StatusChoice};
use account_dashboard::loader::{self, ImportFormat};
use account_dashboard::report;
use account_dashboard::saving::{FileSnapshotStore, SNAPSHOT_KEY, SnapshotStore, open_store};
use account_dashboard::store::AccountStore;
use tempfile::tempdir;

fn contact(name: &str, status: StatusChoice) -> FormValues {
    FormValues {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        phone: "5550001111".to_string(),
        website: format!("https://{}.example.com", name.to_lowercase()),
        industry: "Finance".to_string(),
        status,
        remark: String::new(),
    }
}

#[test]
fn summary_of_ten_accounts() {
    let mut store = AccountStore::empty();
    for i in 0..10 {
        let status = if i < 6 {
            StatusChoice::Active
        } else {
            StatusChoice::Inactive
        };
        let mut form = RecordForm::create();
        form.values = contact(&format!("Company{i}"), status);
        form.submit(&mut store).unwrap();
    }

    let summary = report::summarize(store.accounts());
    assert_eq!(summary.total, 10);
    assert_eq!(summary.active, 6);
    assert_eq!(summary.inactive, 4);
    assert_eq!(report::goal_percentage(store.accounts()), 60);
}

#[test]
fn reversed_range_export_is_rejected() {
    let store = AccountStore::with_seed();
    assert_eq!(store.len(), 22);

    assert!(matches!(
        parse_range("3-2", store.len()),
        Err(DashboardError::InvalidRange { total: 22, .. })
    ));

    // Even a hand-built selection never reaches the codec.
    let table = TableState::default();
    let selection = ExportSelection::Range { start: 3, end: 2 };
    assert!(table.select_for_export(store.accounts(), &selection).is_err());
}

#[test]
fn range_export_writes_the_chosen_rows() {
    let store = AccountStore::with_seed();
    let selection = parse_range("3-7", store.len()).unwrap();
    let rows = TableState::default()
        .select_for_export(store.accounts(), &selection)
        .unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].fields.name, "Dalli");

    let date = chrono::NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
    let file = downloader::to_xlsx(&rows, &selection.label(), date).unwrap();
    assert_eq!(file.filename, "Account_Report_Range_3-7_2025-01-31.xlsx");
    assert!(file.bytes.starts_with(b"PK"));
}

#[test]
fn empty_import_leaves_collection_alone() {
    let mut store = AccountStore::with_seed();
    let result = loader::import_accounts(&mut store, b"Name,Email,Phone\n", ImportFormat::Csv);

    assert!(matches!(result, Err(DashboardError::EmptyImport)));
    assert_eq!(store.len(), 22);
}

#[test]
fn imported_rows_default_industry_and_status() {
    let mut store = AccountStore::with_seed();
    let csv = "Name,Email,Phone,Website,Industry,Status,Remark\n\
               Northwind,sales@northwind.com,2065550100,https://northwind.com,,Inactive,wholesale\n\
               Contoso,info@contoso.com,4255550199,https://contoso.com,,no,\n";

    let report = loader::import_accounts(&mut store, csv.as_bytes(), ImportFormat::Csv).unwrap();

    assert_eq!(report.count(), 2);
    assert_eq!(store.len(), 24);
    for id in &report.created {
        let account = store.get(*id).unwrap();
        assert_eq!(account.fields.industry, "n/a");
        assert!(account.fields.status);
    }
    // Newest first: the last imported row leads the collection.
    assert_eq!(store.accounts()[0].fields.name, "Contoso");
}

#[test]
fn website_filter_ignores_sort_and_page() {
    let store = AccountStore::with_seed();
    let mut table = TableState::default();
    table.set_sort(Column::Name, SortDirection::Desc);
    table.set_page(1);
    table.set_filter("walmart");

    let rows = table.filtered_rows(store.accounts());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].fields.name, "Kort");
}

#[test]
fn changes_survive_a_restart() {
    let dir = tempdir().unwrap();

    let created = {
        let backend = Arc::new(FileSnapshotStore::new(dir.path()));
        let mut store = open_store(backend, true).unwrap();
        assert_eq!(store.len(), 22);

        let mut form = RecordForm::create();
        form.values = contact("Fabrikam", StatusChoice::Inactive);
        let outcome = form.submit(&mut store).unwrap();
        store.delete(store.accounts()[1].id);
        outcome.id
    };

    let backend = Arc::new(FileSnapshotStore::new(dir.path()));
    assert!(backend.read(SNAPSHOT_KEY).unwrap().is_some());

    let store = open_store(backend, true).unwrap();
    assert_eq!(store.len(), 22);
    assert_eq!(store.accounts()[0].id, created);
    assert!(!store.accounts()[0].fields.status);
}

#[test]
fn reset_is_persisted() {
    let dir = tempdir().unwrap();
    {
        let mut store = open_store(Arc::new(FileSnapshotStore::new(dir.path())), false).unwrap();
        assert!(store.is_empty());
        store.reset_to_seed();
    }

    let store = open_store(Arc::new(FileSnapshotStore::new(dir.path())), false).unwrap();
    assert_eq!(store.len(), 22);
}
