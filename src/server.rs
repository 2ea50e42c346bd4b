use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::io;

use serde::Serialize;
use tiny_http::{Header, Method, Request, Response};
use url::Url;

use crate::error::ExtractError;
use crate::filter::{FilterParams, distinct_cost_centers, filter_table};
use crate::options::ExtractOptions;
use crate::{extract_tables_from_bytes, fetch_document, view_to_csv_string};

const CSV_DOWNLOAD_FILENAME: &str = "resultado_filtrado.csv";

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Upstream(String),
    Parse(String),
    Internal(String),
}

impl ApiError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Upstream(_) => "upstream_error",
            Self::Parse(_) => "parse_error",
            Self::Internal(_) => "internal_error",
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(message)
            | Self::NotFound(message)
            | Self::Upstream(message)
            | Self::Parse(message)
            | Self::Internal(message) => message,
        }
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::Upstream(_) => 502,
            Self::Parse(_) => 422,
            Self::Internal(_) => 500,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for ApiError {}

impl From<ExtractError> for ApiError {
    fn from(error: ExtractError) -> Self {
        match error {
            ExtractError::Fetch(_) | ExtractError::FetchStatus(_) => {
                Self::Upstream(error.to_string())
            }
            ExtractError::InvalidOption(_) | ExtractError::InvalidPageSelection(_) => {
                Self::BadRequest(error.to_string())
            }
            ExtractError::NoPagesSelected => Self::NotFound(error.to_string()),
            ExtractError::PdfLoad(_) | ExtractError::Csv(_) | ExtractError::AmbiguousGrid { .. } => {
                Self::Parse(error.to_string())
            }
            ExtractError::Io(_) => Self::Internal(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Debug, Clone, Serialize)]
struct TableResponse {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    row_count: usize,
    fragment_count: usize,
    cost_centers: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
    pub options: ExtractOptions,
}

enum Reply {
    Json(String),
    Csv(String),
}

fn parse_request_url(raw: &str) -> Result<(String, HashMap<String, String>), ApiError> {
    let url = Url::parse(&format!("http://localhost{raw}"))
        .map_err(|error| ApiError::BadRequest(error.to_string()))?;
    let query = url
        .query_pairs()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect::<HashMap<_, _>>();
    Ok((url.path().to_string(), query))
}

fn filter_params_from_query(query: &HashMap<String, String>) -> FilterParams {
    FilterParams::new(
        query.get("q").map(String::as_str),
        query.get("cost_center").map(String::as_str),
    )
}

fn parse_delimiter_query(
    query: &HashMap<String, String>,
    default: u8,
) -> Result<u8, ApiError> {
    let Some(raw) = query.get("delimiter") else {
        return Ok(default);
    };

    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) if ch.is_ascii() => Ok(ch as u8),
        _ => Err(ApiError::BadRequest(
            "delimiter must be a single ASCII character".to_string(),
        )),
    }
}

fn handle(method: &Method, raw_url: &str, options: &ExtractOptions) -> Result<Reply, ApiError> {
    if *method != Method::Get {
        return Err(ApiError::BadRequest("only GET is supported".to_string()));
    }

    let (path, query) = parse_request_url(raw_url)?;
    match path.as_str() {
        "/api/v1/table" => table_reply(&query, options),
        "/api/v1/csv" => csv_reply(&query, options),
        _ => Err(ApiError::NotFound("unknown route".to_string())),
    }
}

fn run_pipeline(
    query: &HashMap<String, String>,
    options: &ExtractOptions,
) -> Result<(crate::MergedTable, crate::FilteredView, usize), ApiError> {
    let src = query
        .get("src")
        .ok_or_else(|| ApiError::BadRequest("missing 'src' query parameter".to_string()))?;

    let bytes = fetch_document(src)?;
    let (table, report) = extract_tables_from_bytes(&bytes, options)?;
    let view = filter_table(&table, &filter_params_from_query(query));
    Ok((table, view, report.fragment_count))
}

fn table_reply(
    query: &HashMap<String, String>,
    options: &ExtractOptions,
) -> Result<Reply, ApiError> {
    let (table, view, fragment_count) = run_pipeline(query, options)?;

    let response = TableResponse {
        columns: view.header_labels(),
        row_count: view.rows.len(),
        rows: view.rows,
        fragment_count,
        cost_centers: distinct_cost_centers(&table),
    };
    let body = serde_json::to_string(&response)
        .map_err(|error| ApiError::Internal(error.to_string()))?;
    Ok(Reply::Json(body))
}

fn csv_reply(query: &HashMap<String, String>, options: &ExtractOptions) -> Result<Reply, ApiError> {
    let delimiter = parse_delimiter_query(query, options.delimiter)?;
    let (_, view, _) = run_pipeline(query, options)?;
    let csv = view_to_csv_string(&view, delimiter)?;
    Ok(Reply::Csv(csv))
}

fn header(name: &str, value: &str) -> Header {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).expect("hardcoded header is valid")
}

fn respond(request: Request, outcome: Result<Reply, ApiError>) {
    let response = match outcome {
        Ok(Reply::Json(body)) => Response::from_string(body)
            .with_status_code(200)
            .with_header(header("Content-Type", "application/json; charset=utf-8"))
            .with_header(header("Cache-Control", "no-store")),
        Ok(Reply::Csv(body)) => Response::from_string(body)
            .with_status_code(200)
            .with_header(header("Content-Type", "text/csv; charset=utf-8"))
            .with_header(header(
                "Content-Disposition",
                &format!("attachment; filename=\"{CSV_DOWNLOAD_FILENAME}\""),
            ))
            .with_header(header("Cache-Control", "no-store")),
        Err(error) => {
            let body = serde_json::to_string(&ErrorBody {
                code: error.code().to_string(),
                message: error.message().to_string(),
            })
            .unwrap_or_else(|_| format!("{{\"code\":\"{}\"}}", error.code()));
            Response::from_string(body)
                .with_status_code(error.status_code())
                .with_header(header("Content-Type", "application/json; charset=utf-8"))
                .with_header(header("Cache-Control", "no-store"))
        }
    };

    if let Err(error) = request.respond(response) {
        tracing::warn!(%error, "failed to write response");
    }
}

/// Runs the blocking request loop. Every request re-runs the full pipeline
/// against its own `src` document; no state is shared between requests.
pub fn run(config: &ServerConfig) -> Result<(), ExtractError> {
    let server = tiny_http::Server::http(&config.addr)
        .map_err(|error| ExtractError::Io(io::Error::other(error.to_string())))?;
    tracing::info!(addr = %config.addr, "serving extraction API");

    for request in server.incoming_requests() {
        let outcome = handle(request.method(), request.url(), &config.options);
        if let Err(error) = &outcome {
            tracing::warn!(%error, url = request.url(), "request failed");
        }
        respond(request, outcome);
    }

    Ok(())
}
