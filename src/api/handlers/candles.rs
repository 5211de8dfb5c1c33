use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::response::{ApiResponse, ApiResult};
use crate::api::state::SharedState;
use crate::engine::{
    Audience, DashboardQuery, DeveloperBatchQuery, DeveloperQuery, EngineError, Payload, ResolutionRequest,
    TimeZoneNormalizer, ValidationError,
};

const SOURCE_HEADER: &str = "x-source";
const CURRENT_TIMESTAMP_HEADER: &str = "x-current-timestamp";
const CURRENT_TIMEZONE_HEADER: &str = "x-current-timezone";

const FETCHED: &str = "Candles fetched successfully";

/// `/candles` 的聯合查詢參數，依 `x-source` 取其中一組
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandleQuery {
    pub symbol: Option<String>,
    pub date: Option<String>,
    pub start_datetime: Option<String>,
    pub end_datetime: Option<String>,
    pub interval: Option<String>,
    #[serde(rename = "ignoreDb")]
    pub ignore_db: Option<String>,
    pub timezone: Option<String>,
}

impl From<CandleQuery> for DashboardQuery {
    fn from(q: CandleQuery) -> Self {
        DashboardQuery {
            symbol: q.symbol,
            date: q.date,
            interval: q.interval,
            ignore_db: q.ignore_db,
            timezone: q.timezone,
        }
    }
}

impl From<CandleQuery> for DeveloperQuery {
    fn from(q: CandleQuery) -> Self {
        DeveloperQuery {
            symbol: q.symbol,
            start_datetime: q.start_datetime,
            end_datetime: q.end_datetime,
            interval: q.interval,
            ignore_db: q.ignore_db,
            timezone: q.timezone,
        }
    }
}

/// 批次查詢中單一代碼的結果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolOutcome {
    pub symbol: String,
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Payload>,
}

/// 從 `x-source` 讀取響應對象，未提供時為 developer
pub fn audience_from_headers(headers: &HeaderMap) -> Result<Audience, ValidationError> {
    match headers.get(SOURCE_HEADER) {
        None => Ok(Audience::Developer),
        Some(value) => value
            .to_str()
            .map_err(|_| ValidationError::InvalidSource(String::from_utf8_lossy(value.as_bytes()).into_owned()))?
            .trim()
            .parse(),
    }
}

/// 從回測標頭讀取執行時刻，時區標頭缺省時使用交易所時區
pub fn as_of_from_headers(
    headers: &HeaderMap,
    normalizer: &TimeZoneNormalizer,
) -> Result<Option<DateTime<Utc>>, ValidationError> {
    let Some(value) = headers.get(CURRENT_TIMESTAMP_HEADER) else {
        return Ok(None);
    };
    let literal = value
        .to_str()
        .map_err(|_| ValidationError::InvalidTimestamp(String::from_utf8_lossy(value.as_bytes()).into_owned()))?;
    let zone = match headers.get(CURRENT_TIMEZONE_HEADER) {
        Some(zone) => Some(
            zone.to_str()
                .map_err(|_| ValidationError::InvalidZone(String::from_utf8_lossy(zone.as_bytes()).into_owned()))?,
        ),
        None => None,
    };

    normalizer.to_utc(literal.trim(), zone.map(str::trim)).map(Some)
}

async fn resolve_one(state: &SharedState, request: ResolutionRequest) -> ApiResult<ApiResponse<Payload>> {
    let resolution = state.resolver.resolve(&request).await?;
    Ok(ApiResponse::ok(FETCHED, resolution.payload))
}

/// GET /candles - 依 `x-source` 決定響應形狀
pub async fn get_candles(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<CandleQuery>,
) -> ApiResult<impl IntoResponse> {
    match audience_from_headers(&headers)? {
        Audience::Dashboard => dashboard(&state, &headers, query.into()).await,
        Audience::Developer => developer(&state, &headers, query.into()).await,
    }
}

/// GET /dashboard/candles
pub async fn get_dashboard_candles(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<impl IntoResponse> {
    dashboard(&state, &headers, query).await
}

/// GET /developer/candles
pub async fn get_developer_candles(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<DeveloperQuery>,
) -> ApiResult<impl IntoResponse> {
    developer(&state, &headers, query).await
}

/// GET /developer/candles/batch - 每個代碼獨立回報成功或失敗
pub async fn get_developer_candles_batch(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<DeveloperBatchQuery>,
) -> ApiResult<impl IntoResponse> {
    let normalizer = state.resolver.normalizer();
    let as_of = as_of_from_headers(&headers, normalizer)?;
    let requests: Vec<ResolutionRequest> = query
        .requests(normalizer)?
        .into_iter()
        .map(|r| r.with_as_of(as_of))
        .collect();

    let results = state.resolver.resolve_many(&requests).await;

    let outcomes: Vec<SymbolOutcome> = requests
        .iter()
        .zip(results)
        .map(|(request, result)| outcome(&request.symbol, result.map(|r| r.payload)))
        .collect();

    Ok(ApiResponse::ok(FETCHED, outcomes))
}

async fn dashboard(
    state: &SharedState,
    headers: &HeaderMap,
    query: DashboardQuery,
) -> ApiResult<ApiResponse<Payload>> {
    let normalizer = state.resolver.normalizer();
    let as_of = as_of_from_headers(headers, normalizer)?;
    let request = ResolutionRequest::from_dashboard(&query, normalizer, &state.session)?.with_as_of(as_of);
    resolve_one(state, request).await
}

async fn developer(
    state: &SharedState,
    headers: &HeaderMap,
    query: DeveloperQuery,
) -> ApiResult<ApiResponse<Payload>> {
    let normalizer = state.resolver.normalizer();
    let as_of = as_of_from_headers(headers, normalizer)?;
    let request = ResolutionRequest::from_developer(&query, normalizer)?.with_as_of(as_of);
    resolve_one(state, request).await
}

fn outcome(symbol: &str, result: Result<Payload, EngineError>) -> SymbolOutcome {
    match result {
        Ok(payload) => SymbolOutcome {
            symbol: symbol.to_string(),
            status_code: 200,
            message: FETCHED.to_string(),
            data: Some(payload),
        },
        Err(err) => SymbolOutcome {
            symbol: symbol.to_string(),
            status_code: err.status_code(),
            message: err.to_string(),
            data: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;
    use chrono::TimeZone;

    #[test]
    fn test_audience_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(audience_from_headers(&headers).unwrap(), Audience::Developer);

        headers.insert(SOURCE_HEADER, HeaderValue::from_static("dashboard"));
        assert_eq!(audience_from_headers(&headers).unwrap(), Audience::Dashboard);

        headers.insert(SOURCE_HEADER, HeaderValue::from_static("robot"));
        assert_matches!(audience_from_headers(&headers), Err(ValidationError::InvalidSource(s)) if s == "robot");
    }

    #[test]
    fn test_as_of_headers() {
        let normalizer = TimeZoneNormalizer::default();
        let mut headers = HeaderMap::new();
        assert_eq!(as_of_from_headers(&headers, &normalizer).unwrap(), None);

        headers.insert(CURRENT_TIMESTAMP_HEADER, HeaderValue::from_static("2025-12-01T10:30:00"));
        assert_eq!(
            as_of_from_headers(&headers, &normalizer).unwrap(),
            Some(Utc.with_ymd_and_hms(2025, 12, 1, 5, 0, 0).unwrap())
        );

        headers.insert(CURRENT_TIMEZONE_HEADER, HeaderValue::from_static("Etc/UTC"));
        assert_eq!(
            as_of_from_headers(&headers, &normalizer).unwrap(),
            Some(Utc.with_ymd_and_hms(2025, 12, 1, 10, 30, 0).unwrap())
        );

        headers.insert(CURRENT_TIMESTAMP_HEADER, HeaderValue::from_static("yesterday"));
        assert_matches!(
            as_of_from_headers(&headers, &normalizer),
            Err(ValidationError::InvalidTimestamp(_))
        );
    }

    #[test]
    fn test_outcome_on_failure_omits_data() {
        let err = EngineError::from(ValidationError::MissingParameter("symbol"));
        let value = serde_json::to_value(outcome("TCS", Err(err))).unwrap();

        assert_eq!(value["symbol"], "TCS");
        assert_eq!(value["statusCode"], 400);
        assert!(value.get("data").is_none());
    }
}
