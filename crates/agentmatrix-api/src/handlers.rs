use crate::{ApiError, ApiResult, AppState};
use agentmatrix_core::{
    average_support_percentage, category_counts, compute_agent_stats, compute_feature_stats,
    provider_counts, rank_agents, rank_features, supported_ides, Agent, AgentStats, CategoryCount,
    CategoryStats, ComparisonMatrix, Feature, FeatureStats, FeatureSupport, FilterCriteria,
    FilterQuery, GlobalStats, MatrixCell, ProviderCount,
};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// `{data, status, message?}` wrapper shared by every `/api` response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            status: "success",
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            status: "error",
            message: Some(message.into()),
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct CompareResponse<'a> {
    pub agents: Vec<&'a Agent>,
    pub features: Vec<&'a Feature>,
    pub matrix: ComparisonMatrix,
    pub statistics: GlobalStats,
}

#[derive(Serialize)]
pub struct CompareStatsResponse {
    pub agents: Vec<AgentStats>,
    pub features: Vec<FeatureStats>,
    pub categories: Vec<CategoryStats>,
    pub global: GlobalStats,
}

#[derive(Serialize)]
pub struct AgentWithStats<'a> {
    #[serde(flatten)]
    pub agent: &'a Agent,
    pub stats: AgentStats,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTotals {
    pub total_agents: usize,
    pub total_providers: usize,
    pub total_features: usize,
    pub average_support_percentage: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentListResponse<'a> {
    pub agents: Vec<AgentWithStats<'a>>,
    pub providers: Vec<ProviderCount>,
    #[serde(rename = "supportedIDEs")]
    pub supported_ides: Vec<String>,
    pub totals: AgentTotals,
}

#[derive(Serialize)]
pub struct AgentDetailResponse<'a> {
    pub agent: &'a Agent,
    pub stats: AgentStats,
    pub support: Vec<FeatureSupport<'a>>,
}

#[derive(Serialize)]
pub struct FeatureWithStats<'a> {
    #[serde(flatten)]
    pub feature: &'a Feature,
    pub stats: FeatureStats,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureListResponse<'a> {
    pub features: Vec<FeatureWithStats<'a>>,
    pub categories: Vec<CategoryCount>,
    pub total_features: usize,
}

#[derive(Serialize)]
pub struct AgentRef<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub provider: &'a str,
}

#[derive(Serialize)]
pub struct AgentCell<'a> {
    pub agent: AgentRef<'a>,
    pub cell: &'a MatrixCell,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDetailResponse<'a> {
    pub feature: &'a Feature,
    pub stats: FeatureStats,
    pub agent_support: Vec<AgentCell<'a>>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Serializes `data` in the success envelope with `Cache-Control` and a
/// content-hash `ETag`; answers 304 when the client already holds it.
pub fn cached_json<T: Serialize>(headers: &HeaderMap, max_age: u32, data: T) -> ApiResult<Response> {
    let body = serde_json::to_vec(&ApiResponse::success(data))
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let etag = format!("\"{:x}\"", Sha256::digest(&body));
    let cache_control = format!("public, max-age={}", max_age);

    let mut response = if headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').any(|tag| tag.trim() == etag))
    {
        StatusCode::NOT_MODIFIED.into_response()
    } else {
        (
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            body,
        )
            .into_response()
    };

    let headers = response.headers_mut();
    headers.insert(
        header::ETAG,
        HeaderValue::from_str(&etag).map_err(|e| ApiError::Internal(e.to_string()))?,
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_str(&cache_control).map_err(|e| ApiError::Internal(e.to_string()))?,
    );
    Ok(response)
}

pub async fn compare(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let criteria = FilterCriteria::from_query(&query)?;
    let view = state.data.view(&criteria)?;

    let response = CompareResponse {
        matrix: view.project_matrix(),
        statistics: view.global_stats(),
        agents: view.agents,
        features: view.features,
    };
    cached_json(&headers, state.cache_max_age(), response)
}

pub async fn compare_stats(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let criteria = FilterCriteria::from_query(&query)?;
    let view = state.data.view(&criteria)?;

    let mut agents = view.agent_stats();
    rank_agents(&mut agents);
    let mut features = view.feature_stats();
    rank_features(&mut features);

    let response = CompareStatsResponse {
        agents,
        features,
        categories: view.category_stats(),
        global: view.global_stats(),
    };
    cached_json(&headers, state.cache_max_age(), response)
}

pub async fn list_agents(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let matrix = state.data.matrix()?;
    let agents = state.data.agents()?;
    let features = state.data.features()?;

    let with_stats: Vec<AgentWithStats<'_>> = agents
        .iter()
        .map(|agent| AgentWithStats {
            agent,
            stats: compute_agent_stats(&agent.id, matrix, features),
        })
        .collect();
    let stats: Vec<AgentStats> = with_stats.iter().map(|a| a.stats.clone()).collect();
    let providers = provider_counts(agents);

    let response = AgentListResponse {
        totals: AgentTotals {
            total_agents: agents.len(),
            total_providers: providers.len(),
            total_features: features.len(),
            average_support_percentage: average_support_percentage(&stats),
        },
        agents: with_stats,
        providers,
        supported_ides: supported_ides(agents),
    };
    cached_json(&headers, state.cache_max_age(), response)
}

pub async fn get_agent(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let agent = state
        .data
        .find_agent(&slug)?
        .ok_or_else(|| ApiError::NotFound("Agent not found".to_string()))?;

    let response = AgentDetailResponse {
        agent,
        stats: compute_agent_stats(&agent.id, state.data.matrix()?, state.data.features()?),
        support: state.data.agent_support(&agent.id)?,
    };
    cached_json(&headers, state.cache_max_age(), response)
}

pub async fn list_features(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let matrix = state.data.matrix()?;
    let agents = state.data.agents()?;
    let features = state.data.features()?;

    let response = FeatureListResponse {
        features: features
            .iter()
            .map(|feature| FeatureWithStats {
                feature,
                stats: compute_feature_stats(&feature.id, matrix, agents),
            })
            .collect(),
        categories: category_counts(features),
        total_features: features.len(),
    };
    cached_json(&headers, state.cache_max_age(), response)
}

pub async fn get_feature(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let feature = state
        .data
        .find_feature(&slug)?
        .ok_or_else(|| ApiError::NotFound("Feature not found".to_string()))?;

    let agent_support = state
        .data
        .feature_support(&feature.id)?
        .into_iter()
        .map(|s| AgentCell {
            agent: AgentRef {
                id: &s.agent.id,
                name: &s.agent.name,
                provider: &s.agent.provider,
            },
            cell: s.cell,
        })
        .collect();

    let response = FeatureDetailResponse {
        feature,
        stats: compute_feature_stats(&feature.id, state.data.matrix()?, state.data.agents()?),
        agent_support,
    };
    cached_json(&headers, state.cache_max_age(), response)
}
