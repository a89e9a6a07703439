#![cfg(not(tarpaulin_include))]

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;

use crate::account::{Account, AccountId};
use crate::browser::{Column, ExportSelection, SortDirection, TableState, parse_range};
use crate::config::DashboardConfig;
use crate::downloader::{self, XLSX_CONTENT_TYPE};
use crate::error::DashboardError;
use crate::form::{FormOutcome, FormValues, RecordForm};
use crate::loader::{self, ImportFormat, ImportReport};
use crate::report::{self, IndustryShare, RECENT_LIMIT, Summary};
use crate::store::AccountStore;

pub struct AppState {
    store: Mutex<AccountStore>,
    page_size: usize,
    max_import_bytes: usize,
}

impl AppState {
    pub fn new(store: AccountStore, config: &DashboardConfig) -> Self {
        AppState {
            store: Mutex::new(store),
            page_size: config.page_size,
            max_import_bytes: config.max_import_bytes,
        }
    }

    fn store(&self) -> MutexGuard<'_, AccountStore> {
        // A panic mid-request cannot leave the collection half-written:
        // every mutation is a single Vec operation.
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Run a mutation on the blocking pool. Each one triggers the snapshot
/// write, which must stay off the async workers.
async fn with_store<T, F>(state: &Arc<AppState>, mutation: F) -> Result<T, DashboardError>
where
    F: FnOnce(&mut AccountStore) -> T + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || mutation(&mut *state.store()))
        .await
        .map_err(|e| DashboardError::Storage(std::io::Error::other(e)))
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = match &self {
            DashboardError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DashboardError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            DashboardError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            DashboardError::InvalidRange { .. }
            | DashboardError::EmptyImport
            | DashboardError::NothingToExport
            | DashboardError::Decode(_) => StatusCode::BAD_REQUEST,
            DashboardError::Encode(_) | DashboardError::Storage(_) | DashboardError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = match &self {
            DashboardError::Validation(errors) => serde_json::json!({
                "status": "error",
                "message": self.to_string(),
                "fields": errors.errors,
            }),
            _ => serde_json::json!({
                "status": "error",
                "message": self.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

#[derive(Deserialize, Default)]
struct ListQuery {
    q: Option<String>,
    sort: Option<String>,
    dir: Option<String>,
    page: Option<usize>,
    scope: Option<String>,
    range: Option<String>,
}

impl ListQuery {
    fn table(&self, page_size: usize) -> TableState {
        let mut table = TableState::new(page_size);
        if let Some(q) = &self.q {
            table.set_filter(q.as_str());
        }
        if let Some(column) = self.sort.as_deref().and_then(Column::parse) {
            let direction = self
                .dir
                .as_deref()
                .and_then(SortDirection::parse)
                .unwrap_or(SortDirection::Asc);
            table.set_sort(column, direction);
        }
        table.set_page(self.page.unwrap_or(0));
        table
    }

    /// `scope=current|all|range`; anything else exports everything.
    fn selection(&self, total: usize) -> Result<ExportSelection, DashboardError> {
        match self.scope.as_deref().map(str::trim) {
            Some(scope) if scope.eq_ignore_ascii_case("current") => Ok(ExportSelection::CurrentPage),
            Some(scope) if scope.eq_ignore_ascii_case("range") => {
                parse_range(self.range.as_deref().unwrap_or_default(), total)
            }
            _ => Ok(ExportSelection::All),
        }
    }
}

/// The file name's extension decides; the declared MIME type is only a
/// fallback for uploads sent without a name.
fn upload_format(file_name: Option<&str>, content_type: Option<&str>) -> Result<ImportFormat, DashboardError> {
    match (file_name, content_type) {
        (Some(name), _) => ImportFormat::from_path(name),
        (None, Some(mime)) => ImportFormat::from_mime(mime),
        (None, None) => Err(DashboardError::UnsupportedFormat("unknown".to_string())),
    }
}

#[derive(Serialize)]
struct PageResponse<'a> {
    rows: Vec<&'a Account>,
    page: usize,
    page_count: usize,
    matched: usize,
    total: usize,
}

#[derive(Serialize)]
struct SummaryResponse<'a> {
    summary: Summary,
    goal_percentage: u32,
    recent: &'a [Account],
}

#[derive(Serialize)]
struct DeleteResponse {
    deleted: bool,
}

pub fn router(state: Arc<AppState>) -> Router {
    // Leave headroom for the multipart framing around the file itself.
    let body_limit = state.max_import_bytes + 64 * 1024;

    Router::new()
        .route("/api/accounts", get(list_accounts).post(create_account))
        .route("/api/accounts/reset", post(reset_accounts))
        .route(
            "/api/accounts/:id",
            put(update_account).delete(delete_account),
        )
        .route("/api/summary", get(get_summary))
        .route("/api/industries", get(get_industries))
        .route("/api/export", get(export_accounts))
        .route("/api/import", post(import_accounts))
        .route("/api/report", get(download_report))
        .route("/api/template", get(download_template))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub async fn run(config: DashboardConfig, store: AccountStore) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::new(store, &config));
    let app = router(state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    log::info!("Listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Response {
    let store = state.store();
    let table = query.table(state.page_size);
    let accounts = store.accounts();

    Json(PageResponse {
        rows: table.visible_rows(accounts),
        page: table.page(),
        page_count: table.page_count(accounts),
        matched: table.filtered_rows(accounts).len(),
        total: accounts.len(),
    })
    .into_response()
}

async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(values): Json<FormValues>,
) -> Result<(StatusCode, Json<FormOutcome>), DashboardError> {
    let mut form = RecordForm::create();
    form.values = values;
    let outcome = with_store(&state, move |store| form.submit(store)).await??;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn update_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(values): Json<FormValues>,
) -> Result<Json<FormOutcome>, DashboardError> {
    let mut form = RecordForm::bound(AccountId(id), values);
    let outcome = with_store(&state, move |store| form.submit(store)).await??;
    Ok(Json(outcome))
}

async fn delete_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<DeleteResponse>, DashboardError> {
    // The HTTP DELETE itself is the user's confirmation.
    let pending = TableState::default().request_delete(AccountId(id));
    let deleted = with_store(&state, move |store| pending.confirm(store)).await?;
    Ok(Json(DeleteResponse { deleted }))
}

async fn reset_accounts(State(state): State<Arc<AppState>>) -> Result<Json<Summary>, DashboardError> {
    let summary = with_store(&state, |store| {
        store.reset_to_seed();
        report::summarize(store.accounts())
    })
    .await?;
    Ok(Json(summary))
}

async fn get_summary(State(state): State<Arc<AppState>>) -> Response {
    let store = state.store();
    let accounts = store.accounts();
    Json(SummaryResponse {
        summary: report::summarize(accounts),
        goal_percentage: report::goal_percentage(accounts),
        recent: report::recent_accounts(accounts, RECENT_LIMIT),
    })
    .into_response()
}

async fn get_industries(State(state): State<Arc<AppState>>) -> Json<Vec<IndustryShare>> {
    Json(report::industry_distribution(state.store().accounts()))
}

fn attachment(content_type: &str, filename: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

async fn export_accounts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Response, DashboardError> {
    let store = state.store();
    let accounts = store.accounts();

    let selection = query.selection(accounts.len())?;

    let table = query.table(state.page_size);
    let rows = table.select_for_export(accounts, &selection)?;
    let today = chrono::Local::now().date_naive();
    let file = downloader::to_xlsx(&rows, &selection.label(), today)?;

    Ok(attachment(XLSX_CONTENT_TYPE, &file.filename, file.bytes))
}

async fn import_accounts(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ImportReport>, DashboardError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DashboardError::Decode(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let format = upload_format(field.file_name(), field.content_type())?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| DashboardError::Decode(e.to_string()))?;
        upload = Some((format, bytes));
    }

    let Some((format, bytes)) = upload else {
        return Err(DashboardError::EmptyImport);
    };
    loader::check_size(&bytes, state.max_import_bytes)?;

    let report =
        with_store(&state, move |store| loader::import_accounts(store, &bytes, format)).await??;
    Ok(Json(report))
}

async fn download_report(State(state): State<Arc<AppState>>) -> Result<Response, DashboardError> {
    let bytes = report::report_to_xlsx(state.store().accounts())?;
    let filename = report::report_filename(chrono::Local::now().date_naive());
    Ok(attachment(XLSX_CONTENT_TYPE, &filename, bytes))
}

async fn download_template() -> Response {
    attachment(
        "text/csv",
        "Account_Import_Template.csv",
        loader::template_csv().into_bytes(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    const BOUNDARY: &str = "dashboard-upload";

    fn app() -> Router {
        let state = AppState::new(AccountStore::with_seed(), &DashboardConfig::default());
        router(Arc::new(state))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Response) {
        let response = app.clone().oneshot(request).await.unwrap();
        (response.status(), response)
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Response) {
        send(app, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn upload(part_headers: &str, content: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n{part_headers}\r\n\r\n{content}\r\n--{BOUNDARY}--\r\n"
        );
        Request::post("/api/import")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    const TWO_ROWS: &str = "Name,Email,Industry\nNorthwind,n@northwind.com,\nContoso,c@contoso.com,\n";

    #[test]
    fn upload_format_prefers_file_name() {
        assert_eq!(
            upload_format(Some("book.xlsx"), Some("text/csv")).unwrap(),
            ImportFormat::Xlsx
        );
        assert_eq!(upload_format(None, Some("text/csv")).unwrap(), ImportFormat::Csv);
        assert!(matches!(
            upload_format(Some("notes.txt"), Some("text/csv")),
            Err(DashboardError::UnsupportedFormat(_))
        ));
        assert!(upload_format(None, None).is_err());
    }

    #[test]
    fn export_scope_mapping() {
        let query = |scope: Option<&str>, range: Option<&str>| ListQuery {
            scope: scope.map(str::to_string),
            range: range.map(str::to_string),
            ..ListQuery::default()
        };

        assert_eq!(query(None, None).selection(22).unwrap(), ExportSelection::All);
        assert_eq!(
            query(Some("Current"), None).selection(22).unwrap(),
            ExportSelection::CurrentPage
        );
        assert_eq!(
            query(Some("range"), Some("3-7")).selection(22).unwrap(),
            ExportSelection::Range { start: 3, end: 7 }
        );
        assert!(query(Some("range"), None).selection(22).is_err());
    }

    #[tokio::test]
    async fn list_sorts_with_uppercase_direction() {
        let app = app();
        let (status, response) = get(&app, "/api/accounts?sort=name&dir=DESC").await;
        assert_eq!(status, StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body["rows"][0]["fields"]["name"], "Zane");
        assert_eq!(body["rows"].as_array().unwrap().len(), 10);
        assert_eq!(body["total"], 22);
    }

    #[tokio::test]
    async fn list_with_huge_page_is_empty() {
        let app = app();
        let (status, response) = get(&app, "/api/accounts?page=18446744073709551615").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json(response).await["rows"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn export_rejects_reversed_range() {
        let app = app();
        let (status, _) = get(&app, "/api/export?scope=range&range=3-2").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, response) = get(&app, "/api/export?scope=range&range=3-7").await;
        assert_eq!(status, StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.contains("Account_Report_Range_3-7_"));
    }

    #[tokio::test]
    async fn import_by_file_name_and_by_mime() {
        let app = app();

        let named = upload(
            "Content-Disposition: form-data; name=\"file\"; filename=\"accounts.csv\"",
            TWO_ROWS,
        );
        let (status, response) = send(&app, named).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(response).await["created"].as_array().unwrap().len(), 2);

        let unnamed = upload(
            "Content-Disposition: form-data; name=\"file\"\r\nContent-Type: text/csv",
            TWO_ROWS,
        );
        let (status, _) = send(&app, unnamed).await;
        assert_eq!(status, StatusCode::OK);

        let (_, response) = get(&app, "/api/summary").await;
        assert_eq!(json(response).await["summary"]["total"], 26);
    }

    #[tokio::test]
    async fn import_rejects_unknown_extension() {
        let app = app();
        let request = upload(
            "Content-Disposition: form-data; name=\"file\"; filename=\"accounts.txt\"",
            TWO_ROWS,
        );
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn invalid_form_lists_field_errors() {
        let app = app();
        let request = Request::post("/api/accounts")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"Half filled"}"#))
            .unwrap();
        let (status, response) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let body = json(response).await;
        assert!(!body["fields"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_then_reset() {
        let app = app();
        let request = Request::delete("/api/accounts/2").body(Body::empty()).unwrap();
        let (status, response) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(response).await["deleted"], true);

        let request = Request::post("/api/accounts/reset").body(Body::empty()).unwrap();
        let (_, response) = send(&app, request).await;
        assert_eq!(json(response).await["total"], 22);
    }
}
