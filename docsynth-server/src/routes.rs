//! HTTP handlers for the docsynth server.

use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::{HttpRequest, HttpResponse, Responder, get, post, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use docsynth_core::{
    AnalysisOptions, AnnotateMode, DEFAULT_ISSUE_LIMIT, DocStyle, DocsynthError, FileAnalysis,
    TemplateSynthesizer, analyze_source, render_analysis_markdown, try_analyze_source,
};

use crate::openapi::ApiDoc;

const DEFAULT_MAX_SOURCE_BYTES: usize = 1_000_000;
/// Sources may double in size once JSON-escaped, and a batch carries several.
const BODY_SOURCES_PER_REQUEST: usize = 8;
const BODY_ENVELOPE_BYTES: usize = 64 * 1024;

/// Analysis defaults loaded from the environment.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    /// Style used when a request does not name one.
    pub default_style: DocStyle,
    /// Issues listed per file in rendered reports.
    pub issue_limit: usize,
    /// Largest accepted source payload, in bytes.
    pub max_source_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            default_style: DocStyle::Google,
            issue_limit: DEFAULT_ISSUE_LIMIT,
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
        }
    }
}

impl ServerConfig {
    /// Build server config from environment variables.
    #[cfg_attr(test, allow(dead_code))]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build server config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let default_style = match lookup("DOCSYNTH_DEFAULT_STYLE") {
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                log::warn!("ignoring DOCSYNTH_DEFAULT_STYLE: {err}");
                defaults.default_style
            }),
            None => defaults.default_style,
        };
        Self {
            default_style,
            issue_limit: parse_number(&lookup, "DOCSYNTH_ISSUE_LIMIT", defaults.issue_limit),
            max_source_bytes: parse_number(
                &lookup,
                "DOCSYNTH_MAX_SOURCE_BYTES",
                defaults.max_source_bytes,
            ),
        }
    }

    fn options(&self, overrides: &RequestOptions) -> AnalysisOptions {
        AnalysisOptions {
            style: overrides.style.unwrap_or(self.default_style),
            validate: overrides.validate.unwrap_or(true),
            mode: if overrides.missing_only.unwrap_or(false) {
                AnnotateMode::MissingOnly
            } else {
                AnnotateMode::All
            },
        }
    }

    /// Largest accepted JSON request body, derived from `max_source_bytes`.
    pub fn body_limit(&self) -> usize {
        self.max_source_bytes
            .saturating_mul(BODY_SOURCES_PER_REQUEST)
            .saturating_add(BODY_ENVELOPE_BYTES)
    }

    fn check_source(&self, source: &str) -> Result<(), SourceRejection> {
        if source.trim().is_empty() {
            return Err(SourceRejection::Empty);
        }
        if source.len() > self.max_source_bytes {
            return Err(SourceRejection::TooLarge(self.max_source_bytes));
        }
        Ok(())
    }
}

fn parse_number(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: usize) -> usize {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("ignoring {key}={raw}: not a number");
            default
        }),
        None => default,
    }
}

enum SourceRejection {
    Empty,
    TooLarge(usize),
}

impl SourceRejection {
    fn message(&self) -> String {
        match self {
            Self::Empty => "source must not be empty".to_string(),
            Self::TooLarge(limit) => format!("source exceeds {limit} bytes"),
        }
    }

    fn response(&self) -> HttpResponse {
        let body = ErrorResponse {
            message: self.message(),
        };
        match self {
            Self::Empty => HttpResponse::BadRequest().json(body),
            Self::TooLarge(_) => HttpResponse::PayloadTooLarge().json(body),
        }
    }
}

/// JSON extractor config sized from `config`; rejected bodies answer with an [`ErrorResponse`].
pub fn json_config(config: &ServerConfig) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(config.body_limit())
        .error_handler(json_error_response)
}

fn json_error_response(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let body = ErrorResponse {
        message: err.to_string(),
    };
    let response = match err {
        JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
            HttpResponse::PayloadTooLarge().json(body)
        }
        _ => HttpResponse::BadRequest().json(body),
    };
    InternalError::from_response(err, response).into()
}

#[derive(Clone)]
/// Shared application state for handlers.
pub struct AppState {
    /// Analysis defaults.
    pub config: ServerConfig,
    /// Docstring synthesizer shared by all requests.
    pub synthesizer: TemplateSynthesizer,
}

impl AppState {
    /// Create state around a config with the template synthesizer.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            synthesizer: TemplateSynthesizer::new(),
        }
    }
}

/// Per-request analysis overrides.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    /// Docstring style; the server default applies when absent.
    pub style: Option<DocStyle>,
    /// Whether compliance issues are listed in the report.
    pub validate: Option<bool>,
    /// Only synthesize docstrings for undocumented definitions.
    pub missing_only: Option<bool>,
}

/// Request payload for a single-file analysis.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Name shown in reports.
    pub file_name: String,
    /// Python source text.
    pub source: String,
    /// Analysis overrides.
    #[serde(flatten)]
    pub options: RequestOptions,
}

/// Response payload for a single-file analysis.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    /// Identifier assigned to this analysis.
    pub analysis_id: String,
    /// RFC 3339 timestamp of the analysis.
    pub created_at: String,
    /// Analysis results.
    #[serde(flatten)]
    pub analysis: FileAnalysis,
    /// Markdown rendering of the analysis.
    pub report: String,
}

/// One file in a batch request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchFile {
    /// Name shown in reports.
    pub file_name: String,
    /// Python source text.
    pub source: String,
}

/// Request payload for a batch analysis.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchAnalyzeRequest {
    /// Files to analyze, in presentation order.
    pub files: Vec<BatchFile>,
    /// Analysis overrides shared by every file.
    #[serde(flatten)]
    pub options: RequestOptions,
}

/// Response payload for a batch analysis.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchAnalyzeResponse {
    /// Identifier assigned to this batch.
    pub batch_id: String,
    /// RFC 3339 timestamp of the batch.
    pub created_at: String,
    /// Per-file results in request order.
    pub analyses: Vec<FileAnalysis>,
    /// Markdown rendering of every analysis.
    pub report: String,
}

/// A selectable docstring style.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StyleOption {
    /// Style value accepted in requests.
    pub id: DocStyle,
    /// Human-readable label.
    pub label: String,
}

/// Response payload listing docstring styles.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StylesResponse {
    /// Supported styles.
    pub styles: Vec<StyleOption>,
    /// Style applied when a request does not name one.
    pub default_style: DocStyle,
}

/// Error response payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Analysis results", body = AnalyzeResponse),
        (status = 400, description = "Empty source", body = ErrorResponse),
        (status = 413, description = "Source too large", body = ErrorResponse),
        (status = 422, description = "Source could not be parsed", body = ErrorResponse),
        (status = 500, description = "Analysis failed", body = ErrorResponse)
    ),
    tag = "analysis"
)]
#[post("/api/analyze")]
/// Analyze one Python source and return it with synthesized docstrings.
pub async fn analyze(
    state: web::Data<AppState>,
    payload: web::Json<AnalyzeRequest>,
) -> impl Responder {
    let payload = payload.into_inner();
    if let Err(rejection) = state.config.check_source(&payload.source) {
        return rejection.response();
    }

    let options = state.config.options(&payload.options);
    let synthesizer = state.synthesizer.clone();
    let issue_limit = state.config.issue_limit;
    let result = web::block(move || {
        try_analyze_source(&payload.file_name, &payload.source, &options, &synthesizer)
    })
    .await;

    match result {
        Ok(Ok(analysis)) => {
            let report = render_analysis_markdown(std::slice::from_ref(&analysis), issue_limit);
            HttpResponse::Ok().json(AnalyzeResponse {
                analysis_id: Uuid::new_v4().to_string(),
                created_at: Utc::now().to_rfc3339(),
                analysis,
                report,
            })
        }
        Ok(Err(DocsynthError::Parse(message))) => {
            HttpResponse::UnprocessableEntity().json(ErrorResponse {
                message: format!("parse error: {message}"),
            })
        }
        Ok(Err(err)) => HttpResponse::InternalServerError().json(ErrorResponse {
            message: err.to_string(),
        }),
        Err(err) => HttpResponse::InternalServerError().json(ErrorResponse {
            message: format!("analysis failed: {err}"),
        }),
    }
}

#[utoipa::path(
    post,
    path = "/analyze/batch",
    request_body = BatchAnalyzeRequest,
    responses(
        (status = 200, description = "Per-file analysis results", body = BatchAnalyzeResponse),
        (status = 400, description = "No files supplied", body = ErrorResponse),
        (status = 500, description = "Analysis failed", body = ErrorResponse)
    ),
    tag = "analysis"
)]
#[post("/api/analyze/batch")]
/// Analyze several Python sources; failures are reported per file.
pub async fn analyze_batch(
    state: web::Data<AppState>,
    payload: web::Json<BatchAnalyzeRequest>,
) -> impl Responder {
    let payload = payload.into_inner();
    if payload.files.is_empty() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            message: "at least one file is required".to_string(),
        });
    }

    let options = state.config.options(&payload.options);
    let config = state.config.clone();
    let synthesizer = state.synthesizer.clone();
    let result = web::block(move || {
        payload
            .files
            .iter()
            .map(|file| match config.check_source(&file.source) {
                Ok(()) => analyze_source(&file.file_name, &file.source, &options, &synthesizer),
                Err(rejection) => {
                    FileAnalysis::failed(file.file_name.clone(), &options, rejection.message())
                }
            })
            .collect::<Vec<_>>()
    })
    .await;

    match result {
        Ok(analyses) => {
            let report = render_analysis_markdown(&analyses, state.config.issue_limit);
            HttpResponse::Ok().json(BatchAnalyzeResponse {
                batch_id: Uuid::new_v4().to_string(),
                created_at: Utc::now().to_rfc3339(),
                analyses,
                report,
            })
        }
        Err(err) => HttpResponse::InternalServerError().json(ErrorResponse {
            message: format!("batch analysis failed: {err}"),
        }),
    }
}

#[utoipa::path(
    get,
    path = "/styles",
    responses(
        (status = 200, description = "Supported docstring styles", body = StylesResponse)
    ),
    tag = "analysis"
)]
#[get("/api/styles")]
/// List supported docstring styles.
pub async fn styles(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(StylesResponse {
        styles: DocStyle::ALL
            .into_iter()
            .map(|style| StyleOption {
                id: style,
                label: style.label().to_string(),
            })
            .collect(),
        default_style: state.config.default_style,
    })
}

#[utoipa::path(
    get,
    path = "/openapi.json",
    responses(
        (status = 200, description = "OpenAPI document", body = serde_json::Value)
    ),
    tag = "system"
)]
#[get("/api/openapi.json")]
/// Serve the OpenAPI document.
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}
