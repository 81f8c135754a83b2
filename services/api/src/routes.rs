use crate::infra::AppState;
use allocation_curator::curation::{
    apply_modification, filter_records, run_validations, skill_risks, ActionKind, BusinessRule,
    Client, Dataset, DatasetSnapshot, EntityKind, ModificationCommand, PriorityWeights,
    ReadinessSummary, RuleBook, RulesConfig, SearchFilter, Task, ValidationFinding, Worker,
};
use allocation_curator::error::AppError;
use allocation_curator::export::{export_dataset, rules_config_json, ExportFormat, RULES_FILE_NAME};
use allocation_curator::ingest::{EntityImporter, ImportFormat};
use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::io::Cursor;

const NO_FILTERS_HINT: &str = "No filters could be derived from the query; try rephrasing.";
const NO_RULE_HINT: &str = "No rule could be derived from the description; try rephrasing.";

pub(crate) fn curation_router() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/curation/validate", post(validate_endpoint))
        .route("/api/v1/curation/modify", post(modify_endpoint))
        .route("/api/v1/curation/search", post(search_endpoint))
        .route(
            "/api/v1/curation/recommendations",
            post(recommendations_endpoint),
        )
        .route("/api/v1/import/:entity", post(import_endpoint))
        .route("/api/v1/rules/convert", post(convert_rule_endpoint))
        .route("/api/v1/rules/validate", post(validate_rules_endpoint))
        .route("/api/v1/export/data", post(export_data_endpoint))
        .route("/api/v1/export/rules", post(export_rules_endpoint))
}

pub(crate) async fn healthcheck() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Records of one entity kind, serialized as a plain array.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum EntityRecords {
    Clients(Vec<Client>),
    Workers(Vec<Worker>),
    Tasks(Vec<Task>),
}

impl EntityRecords {
    fn len(&self) -> usize {
        match self {
            Self::Clients(records) => records.len(),
            Self::Workers(records) => records.len(),
            Self::Tasks(records) => records.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ValidationResponse {
    pub(crate) evaluated_at: DateTime<Utc>,
    pub(crate) findings: Vec<ValidationFinding>,
    pub(crate) summary: ReadinessSummary,
}

impl ValidationResponse {
    fn evaluate(dataset: &Dataset) -> Self {
        let findings = run_validations(dataset);
        let summary = ReadinessSummary::from_findings(&findings);
        Self {
            evaluated_at: Utc::now(),
            findings,
            summary,
        }
    }
}

pub(crate) async fn validate_endpoint(Json(dataset): Json<Dataset>) -> Json<ValidationResponse> {
    Json(ValidationResponse::evaluate(&dataset))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModifyRequest {
    pub(crate) dataset: Dataset,
    pub(crate) action: Value,
}

#[derive(Debug, Serialize)]
pub(crate) struct ModifyResponse {
    pub(crate) action: ActionKind,
    pub(crate) entity: EntityKind,
    pub(crate) matched: usize,
    pub(crate) dataset: Dataset,
    pub(crate) validation: ValidationResponse,
}

pub(crate) async fn modify_endpoint(
    Json(request): Json<ModifyRequest>,
) -> Result<Json<ModifyResponse>, AppError> {
    let command = ModificationCommand::from_action(&request.action)?;
    let outcome = apply_modification(&request.dataset, &command)?;
    let validation = ValidationResponse::evaluate(&outcome.dataset);

    Ok(Json(ModifyResponse {
        action: command.kind(),
        entity: outcome.entity,
        matched: outcome.matched,
        dataset: outcome.dataset,
        validation,
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchRequest {
    pub(crate) entity: EntityKind,
    #[serde(default)]
    pub(crate) filters: Value,
    pub(crate) dataset: Dataset,
}

#[derive(Debug, Serialize)]
pub(crate) struct SearchResponse {
    pub(crate) entity: EntityKind,
    pub(crate) matched: usize,
    pub(crate) records: EntityRecords,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) hint: Option<&'static str>,
}

pub(crate) async fn search_endpoint(
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let SearchRequest {
        entity,
        filters,
        dataset,
    } = request;
    let filters = SearchFilter::parse_all(&json!({ "filters": filters }))?;

    let (records, hint) = if filters.is_empty() {
        let empty = match entity {
            EntityKind::Clients => EntityRecords::Clients(Vec::new()),
            EntityKind::Workers => EntityRecords::Workers(Vec::new()),
            EntityKind::Tasks => EntityRecords::Tasks(Vec::new()),
        };
        (empty, Some(NO_FILTERS_HINT))
    } else {
        let records = match entity {
            EntityKind::Clients => EntityRecords::Clients(filter_records(&dataset.clients, &filters)),
            EntityKind::Workers => EntityRecords::Workers(filter_records(&dataset.workers, &filters)),
            EntityKind::Tasks => EntityRecords::Tasks(filter_records(&dataset.tasks, &filters)),
        };
        (records, None)
    };

    Ok(Json(SearchResponse {
        entity,
        matched: records.len(),
        records,
        hint,
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecommendationRequest {
    pub(crate) dataset: Dataset,
    #[serde(default)]
    pub(crate) rules: Vec<BusinessRule>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RecommendationResponse {
    pub(crate) risks: Vec<String>,
    pub(crate) snapshot: DatasetSnapshot,
    pub(crate) text: String,
}

pub(crate) async fn recommendations_endpoint(
    Json(request): Json<RecommendationRequest>,
) -> Json<RecommendationResponse> {
    let risks = skill_risks(&request.dataset);
    let snapshot = DatasetSnapshot::capture(&request.dataset, request.rules.len());
    let text = if risks.is_empty() {
        "Your data setup looks solid! No immediate risks or obvious rule recommendations were found."
            .to_string()
    } else {
        format!(
            "Here are some recommendations based on your current setup:\n\n- {}",
            risks.join("\n\n- ")
        )
    };

    Json(RecommendationResponse {
        risks,
        snapshot,
        text,
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImportParams {
    #[serde(default = "default_import_format")]
    pub(crate) format: String,
}

fn default_import_format() -> String {
    "csv".to_string()
}

#[derive(Debug, Serialize)]
pub(crate) struct ImportResponse {
    pub(crate) entity: EntityKind,
    pub(crate) rows: usize,
    pub(crate) records: EntityRecords,
}

pub(crate) async fn import_endpoint(
    Extension(state): Extension<AppState>,
    Path(entity): Path<EntityKind>,
    Query(params): Query<ImportParams>,
    body: String,
) -> Result<Json<ImportResponse>, AppError> {
    let format: ImportFormat = params.format.parse()?;
    let importer = EntityImporter::new(state.max_import_rows);
    let reader = Cursor::new(body.into_bytes());

    let records = match entity {
        EntityKind::Clients => EntityRecords::Clients(importer.import(reader, format)?),
        EntityKind::Workers => EntityRecords::Workers(importer.import(reader, format)?),
        EntityKind::Tasks => EntityRecords::Tasks(importer.import(reader, format)?),
    };

    Ok(Json(ImportResponse {
        entity,
        rows: records.len(),
        records,
    }))
}

#[derive(Debug, Serialize)]
pub(crate) struct ConvertRuleResponse {
    pub(crate) rule: Option<BusinessRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) hint: Option<&'static str>,
}

pub(crate) async fn convert_rule_endpoint(
    Json(candidate): Json<Value>,
) -> Result<Json<ConvertRuleResponse>, AppError> {
    let rule = BusinessRule::from_collaborator(&candidate)?;
    let response = match rule {
        Some(rule) => ConvertRuleResponse {
            description: Some(rule.to_string()),
            rule: Some(rule),
            hint: None,
        },
        None => ConvertRuleResponse {
            rule: None,
            description: None,
            hint: Some(NO_RULE_HINT),
        },
    };
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub(crate) struct RulesRequest {
    #[serde(default)]
    pub(crate) rules: Vec<BusinessRule>,
    #[serde(default)]
    pub(crate) priorities: Map<String, Value>,
}

impl RulesRequest {
    fn into_config(self) -> Result<RulesConfig, AppError> {
        let mut book = RuleBook::new();
        for rule in self.rules {
            book.add(rule)?;
        }
        let mut priorities = PriorityWeights::default();
        priorities.merge(&self.priorities)?;
        Ok(RulesConfig::new(&book, priorities))
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RulesResponse {
    pub(crate) config: RulesConfig,
    pub(crate) descriptions: Vec<String>,
}

pub(crate) async fn validate_rules_endpoint(
    Json(request): Json<RulesRequest>,
) -> Result<Json<RulesResponse>, AppError> {
    let config = request.into_config()?;
    let descriptions = config.rules.iter().map(ToString::to_string).collect();
    Ok(Json(RulesResponse {
        config,
        descriptions,
    }))
}

fn attachment(file_name: &str, content_type: &str, body: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExportParams {
    pub(crate) entity: EntityKind,
    pub(crate) format: String,
}

pub(crate) async fn export_data_endpoint(
    Query(params): Query<ExportParams>,
    Json(dataset): Json<Dataset>,
) -> Result<Response, AppError> {
    let format: ExportFormat = params.format.parse()?;
    let document = export_dataset(&dataset, params.entity, format)?;
    Ok(attachment(
        &document.file_name,
        document.content_type,
        document.body,
    ))
}

pub(crate) async fn export_rules_endpoint(
    Json(request): Json<RulesRequest>,
) -> Result<Response, AppError> {
    let config = request.into_config()?;
    let text = rules_config_json(&config)?;
    Ok(attachment(
        RULES_FILE_NAME,
        ExportFormat::Json.content_type(),
        text.into_bytes(),
    ))
}
