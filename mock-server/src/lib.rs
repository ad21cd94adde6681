use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Key with full access.
pub const VALID_KEY: &str = "test-api-key";
/// Key whose plan excludes batch jobs and usage history.
pub const FREE_TIER_KEY: &str = "free-tier-key";
/// Key that is always over its rate limit.
pub const RATE_LIMITED_KEY: &str = "rate-limited-key";
pub const RATE_LIMIT_RETRY_AFTER: u64 = 30;
/// Looking up this IČO makes the server fail with 500.
pub const FAULTY_ICO: &str = "99999999";
pub const AUTOCOMPLETE_MAX_LIMIT: u32 = 20;
pub const MONTHLY_QUOTA: u64 = 1000;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Company {
    pub id: u64,
    pub ico: String,
    pub orsr_id: String,
    pub name: String,
    pub city: String,
    pub legal_form: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct BatchJob {
    pub batch_id: Uuid,
    pub kind: &'static str,
    pub queries: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Plan {
    Free,
    Starter,
}

pub struct AppState {
    companies: Vec<Company>,
    batches: RwLock<HashMap<Uuid, BatchJob>>,
    requests: AtomicU64,
}

pub type Db = Arc<AppState>;

/// An API error response: JSON body plus an optional `Retry-After`.
#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    body: Value,
    retry_after: Option<u64>,
}

impl Failure {
    fn new(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
            retry_after: None,
        }
    }

    fn validation(field: &str, message: &str) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({
                "message": "Validation failed",
                "errors": { field: [message] },
            }),
        )
    }

    fn not_found(message: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, json!({ "message": message }))
    }

    fn forbidden(message: &str) -> Self {
        Self::new(StatusCode::FORBIDDEN, json!({ "message": message }))
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();
        if let Some(secs) = self.retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

type ApiResult = Result<Json<Value>, Failure>;

fn seed_companies() -> Vec<Company> {
    let rows = [
        (1, "51636549", "427482", "Version Two s. r. o.", "Bratislava", "s.r.o."),
        (2, "35757442", "118260", "Slovenské elektrárne, a.s.", "Bratislava", "a.s."),
        (3, "31322832", "5271", "Tatra banka, a.s.", "Bratislava", "a.s."),
        (4, "36631124", "229831", "Kosit a.s.", "Košice", "a.s."),
        (5, "51636590", "427500", "Version Three s. r. o.", "Žilina", "s.r.o."),
    ];
    rows.into_iter()
        .map(|(id, ico, orsr_id, name, city, legal_form)| Company {
            id,
            ico: ico.to_string(),
            orsr_id: orsr_id.to_string(),
            name: name.to_string(),
            city: city.to_string(),
            legal_form: legal_form.to_string(),
        })
        .collect()
}

pub fn app() -> Router {
    let db: Db = Arc::new(AppState {
        companies: seed_companies(),
        batches: RwLock::new(HashMap::new()),
        requests: AtomicU64::new(0),
    });
    Router::new()
        .route("/company/ico/{ico}", get(company_by_ico))
        .route("/company/id/{orsr_id}", get(company_by_orsr_id))
        .route("/company/{id}", get(company_by_id))
        .route("/search/autocomplete", get(search_autocomplete))
        .route("/search/name", get(search_by_name))
        .route("/search/ico", get(search_by_ico))
        .route("/search/advanced", get(search_advanced))
        .route("/batch/ico", post(batch_by_ico))
        .route("/batch/names", post(batch_by_names))
        .route("/batch/{id}/status", get(batch_status))
        .route("/batch/{id}/results", get(batch_results))
        .route("/account/usage", get(account_usage))
        .route("/account/quota", get(account_quota))
        .route("/account/history", get(account_history))
        .fallback(|| async { Failure::not_found("Endpoint not found") })
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Check the bearer token and count the request against the key's usage.
fn authorize(db: &AppState, headers: &HeaderMap) -> Result<Plan, Failure> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let plan = match token {
        None => {
            return Err(Failure::new(
                StatusCode::UNAUTHORIZED,
                json!({ "message": "Unauthenticated." }),
            ))
        }
        Some(VALID_KEY) => Plan::Starter,
        Some(FREE_TIER_KEY) => Plan::Free,
        Some(RATE_LIMITED_KEY) => {
            tracing::debug!("rejecting rate-limited key");
            return Err(Failure {
                status: StatusCode::TOO_MANY_REQUESTS,
                body: json!({ "message": "Too many requests" }),
                retry_after: Some(RATE_LIMIT_RETRY_AFTER),
            });
        }
        Some(_) => {
            return Err(Failure::new(
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Invalid API key" }),
            ))
        }
    };
    db.requests.fetch_add(1, Ordering::Relaxed);
    Ok(plan)
}

fn require_starter(plan: Plan, feature: &str) -> Result<(), Failure> {
    match plan {
        Plan::Starter => Ok(()),
        Plan::Free => Err(Failure::forbidden(&format!(
            "{feature} requires Starter plan or higher"
        ))),
    }
}

fn validate_ico(ico: &str) -> Result<(), Failure> {
    if ico.len() != 8 {
        return Err(Failure::validation("ico", "The ico must be 8 characters."));
    }
    if !ico.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Failure::validation("ico", "The ico must contain only digits."));
    }
    Ok(())
}

// --- companies ---

async fn company_by_ico(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(ico): Path<String>,
) -> ApiResult {
    authorize(&db, &headers)?;
    validate_ico(&ico)?;
    if ico == FAULTY_ICO {
        return Err(Failure::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "Internal server error" }),
        ));
    }
    db.companies
        .iter()
        .find(|c| c.ico == ico)
        .map(|c| Json(json!({ "data": c })))
        .ok_or_else(|| Failure::not_found("Company not found"))
}

async fn company_by_orsr_id(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(orsr_id): Path<String>,
) -> ApiResult {
    authorize(&db, &headers)?;
    db.companies
        .iter()
        .find(|c| c.orsr_id == orsr_id)
        .map(|c| Json(json!({ "data": c })))
        .ok_or_else(|| Failure::not_found("Company not found"))
}

async fn company_by_id(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> ApiResult {
    authorize(&db, &headers)?;
    db.companies
        .iter()
        .find(|c| c.id == id)
        .map(|c| Json(json!({ "data": c })))
        .ok_or_else(|| Failure::not_found("Company not found"))
}

// --- search ---

#[derive(Deserialize)]
pub struct AutocompleteParams {
    pub q: String,
    pub limit: Option<u32>,
}

#[derive(Deserialize)]
pub struct PagedParams {
    pub q: String,
    #[serde(default)]
    pub exact: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

fn page(matches: Vec<&Company>, limit: usize, offset: usize) -> Value {
    let total = matches.len();
    let data: Vec<&Company> = matches.into_iter().skip(offset).take(limit).collect();
    json!({
        "data": data,
        "meta": { "total": total, "limit": limit, "offset": offset },
    })
}

async fn search_autocomplete(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<AutocompleteParams>,
) -> ApiResult {
    authorize(&db, &headers)?;
    if params.q.chars().count() < 2 {
        return Err(Failure::validation("q", "The q must be at least 2 characters."));
    }
    let limit = params.limit.unwrap_or(10);
    if limit > AUTOCOMPLETE_MAX_LIMIT {
        return Err(Failure::validation(
            "limit",
            "The limit may not be greater than 20.",
        ));
    }
    let needle = params.q.to_lowercase();
    let matches: Vec<&Company> = db
        .companies
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&needle))
        .collect();
    let more = matches.len() > limit as usize;
    let results: Vec<Value> = matches
        .into_iter()
        .take(limit as usize)
        .map(|c| json!({ "id": c.ico, "text": c.name, "ico": c.ico, "city": c.city }))
        .collect();
    Ok(Json(json!({
        "results": results,
        "pagination": { "more": more },
    })))
}

async fn search_by_name(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<PagedParams>,
) -> ApiResult {
    authorize(&db, &headers)?;
    let exact = params.exact.as_deref() == Some("1");
    let needle = params.q.to_lowercase();
    let matches: Vec<&Company> = db
        .companies
        .iter()
        .filter(|c| {
            let name = c.name.to_lowercase();
            if exact {
                name == needle
            } else {
                name.contains(&needle)
            }
        })
        .collect();
    Ok(Json(page(
        matches,
        params.limit.unwrap_or(10),
        params.offset.unwrap_or(0),
    )))
}

async fn search_by_ico(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<PagedParams>,
) -> ApiResult {
    authorize(&db, &headers)?;
    let matches: Vec<&Company> = db
        .companies
        .iter()
        .filter(|c| c.ico.starts_with(&params.q))
        .collect();
    Ok(Json(page(
        matches,
        params.limit.unwrap_or(10),
        params.offset.unwrap_or(0),
    )))
}

fn company_field(company: &Company, key: &str) -> Option<String> {
    match key {
        "name" => Some(company.name.to_lowercase()),
        "city" => Some(company.city.to_lowercase()),
        "legal_form" => Some(company.legal_form.to_lowercase()),
        "ico" => Some(company.ico.clone()),
        _ => None,
    }
}

async fn search_advanced(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult {
    authorize(&db, &headers)?;
    let filters: Vec<(&str, String)> = params
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "limit" | "offset"))
        .map(|(key, value)| (key.as_str(), value.to_lowercase()))
        .collect();
    if let Some((unknown, _)) = filters
        .iter()
        .find(|(key, _)| !matches!(*key, "name" | "city" | "legal_form" | "ico"))
    {
        return Err(Failure::validation(unknown, "Unknown search field."));
    }
    let matches: Vec<&Company> = db
        .companies
        .iter()
        .filter(|c| {
            filters.iter().all(|(key, value)| {
                company_field(c, key).is_some_and(|actual| actual.contains(value.as_str()))
            })
        })
        .collect();
    let limit = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(10);
    let offset = params.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
    Ok(Json(page(matches, limit, offset)))
}

// --- batch ---

#[derive(Deserialize)]
pub struct BatchIcos {
    #[serde(default)]
    pub icos: Vec<String>,
}

#[derive(Deserialize)]
pub struct BatchNames {
    #[serde(default)]
    pub names: Vec<String>,
}

async fn submit_batch(
    db: &AppState,
    kind: &'static str,
    queries: Vec<String>,
) -> (StatusCode, Json<Value>) {
    let job = BatchJob {
        batch_id: Uuid::new_v4(),
        kind,
        queries,
    };
    let body = json!({
        "batch_id": job.batch_id,
        "status": "completed",
        "total": job.queries.len(),
    });
    tracing::debug!(batch_id = %job.batch_id, kind, "batch job accepted");
    db.batches.write().await.insert(job.batch_id, job);
    (StatusCode::ACCEPTED, Json(body))
}

async fn batch_by_ico(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<BatchIcos>,
) -> Result<(StatusCode, Json<Value>), Failure> {
    let plan = authorize(&db, &headers)?;
    require_starter(plan, "Batch lookup")?;
    if input.icos.is_empty() {
        return Err(Failure::validation("icos", "The icos field is required."));
    }
    for ico in &input.icos {
        validate_ico(ico)?;
    }
    Ok(submit_batch(&db, "ico", input.icos).await)
}

async fn batch_by_names(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<BatchNames>,
) -> Result<(StatusCode, Json<Value>), Failure> {
    let plan = authorize(&db, &headers)?;
    require_starter(plan, "Batch lookup")?;
    if input.names.is_empty() {
        return Err(Failure::validation("names", "The names field is required."));
    }
    Ok(submit_batch(&db, "names", input.names).await)
}

async fn find_batch(db: &AppState, id: &str) -> Result<BatchJob, Failure> {
    let id: Uuid = id
        .parse()
        .map_err(|_| Failure::not_found("Batch not found"))?;
    db.batches
        .read()
        .await
        .get(&id)
        .cloned()
        .ok_or_else(|| Failure::not_found("Batch not found"))
}

async fn batch_status(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult {
    authorize(&db, &headers)?;
    let job = find_batch(&db, &id).await?;
    Ok(Json(json!({
        "batch_id": job.batch_id,
        "status": "completed",
        "total": job.queries.len(),
        "processed": job.queries.len(),
    })))
}

async fn batch_results(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult {
    authorize(&db, &headers)?;
    let job = find_batch(&db, &id).await?;
    let results: Vec<Value> = job
        .queries
        .iter()
        .map(|query| {
            let found = db.companies.iter().find(|c| match job.kind {
                "ico" => &c.ico == query,
                _ => c.name.eq_ignore_ascii_case(query),
            });
            json!({ "query": query, "found": found.is_some(), "data": found })
        })
        .collect();
    Ok(Json(json!({ "batch_id": job.batch_id, "results": results })))
}

// --- account ---

async fn account_usage(State(db): State<Db>, headers: HeaderMap) -> ApiResult {
    let plan = authorize(&db, &headers)?;
    Ok(Json(json!({
        "plan": match plan { Plan::Free => "free", Plan::Starter => "starter" },
        "period": "current",
        "requests": db.requests.load(Ordering::Relaxed),
    })))
}

async fn account_quota(State(db): State<Db>, headers: HeaderMap) -> ApiResult {
    authorize(&db, &headers)?;
    let used = db.requests.load(Ordering::Relaxed);
    Ok(Json(json!({
        "limit": MONTHLY_QUOTA,
        "used": used,
        "remaining": MONTHLY_QUOTA.saturating_sub(used),
    })))
}

async fn account_history(State(db): State<Db>, headers: HeaderMap) -> ApiResult {
    let plan = authorize(&db, &headers)?;
    require_starter(plan, "Usage history")?;
    Ok(Json(json!({
        "history": [
            { "period": "2026-08", "requests": 412 },
            { "period": "2026-09", "requests": 655 },
        ],
    })))
}
