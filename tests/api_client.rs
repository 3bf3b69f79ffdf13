mod common;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use companies_house::{
    AdvancedSearchParams, ApiSettings, CompaniesHouseClient, CompanyNumber, Error,
};
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const API_KEY: &str = "test-key";
// base64("test-key:")
const EXPECTED_AUTH: &str = "Basic dGVzdC1rZXk6";

#[derive(Clone, Default)]
struct Upstream {
    hits: Arc<AtomicUsize>,
    last_query: Arc<Mutex<HashMap<String, String>>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        == Some(EXPECTED_AUTH)
}

fn profile(number: &str) -> Value {
    json!({
        "company_name": "MARGARET TOWNSEND LIMITED",
        "company_number": number,
        "company_status": "active",
        "date_of_creation": "1862-10-25",
        "type": "ltd",
        "has_charges": false,
        "sic_codes": ["82990"],
        "registered_office_address": {
            "address_line_1": "1 High Street",
            "locality": "London",
            "postal_code": "N1 1AA"
        }
    })
}

async fn company(
    State(upstream): State<Upstream>,
    Path(number): Path<String>,
    headers: HeaderMap,
) -> Response {
    upstream.hits.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match number.as_str() {
        "99999999" => (
            StatusCode::NOT_FOUND,
            Json(json!({"errors": [{"error": "company-profile-not-found", "type": "ch:service"}]})),
        )
            .into_response(),
        "88888888" => (StatusCode::OK, "<html>maintenance</html>").into_response(),
        _ => Json(profile(&number)).into_response(),
    }
}

async fn advanced_search(
    State(upstream): State<Upstream>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    upstream.hits.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    *upstream.last_query.lock().unwrap() = query;
    Json(json!({
        "hits": 3,
        "kind": "search#advanced-search",
        "items": [
            {"company_name": "ALPHA LTD", "company_number": "15700001", "company_status": "active"},
            {"company_name": "BETA LTD", "company_number": "15700002", "company_status": "active"},
            {"company_name": "GAMMA LTD", "company_number": "15700003", "company_status": "active"}
        ]
    }))
    .into_response()
}

async fn start(api_key: &str) -> (CompaniesHouseClient, Upstream) {
    let upstream = Upstream::default();
    let app = Router::new()
        .route("/company/:number", get(company))
        .route("/advanced-search/companies", get(advanced_search))
        .with_state(upstream.clone());
    let base_url = common::serve(app).await;

    let client = CompaniesHouseClient::new(&ApiSettings {
        api_key: api_key.to_string(),
        base_url,
    });
    (client, upstream)
}

fn may_2024() -> AdvancedSearchParams {
    AdvancedSearchParams {
        incorporated_from: NaiveDate::from_ymd_opt(2024, 5, 6),
        incorporated_to: NaiveDate::from_ymd_opt(2024, 6, 5),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_profile_as_table_has_one_row_per_key() {
    let (client, _) = start(API_KEY).await;

    for raw in ["00000006", "SC123456", "1800000"] {
        let number = CompanyNumber::parse(raw).unwrap();
        let table = client.get_company_profile_as_table(&number).await.unwrap();
        assert_eq!(table.num_rows(), 1);

        let expected: BTreeSet<String> = profile(number.as_str())
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        let actual: BTreeSet<String> = table.column_names().into_iter().collect();
        assert_eq!(actual, expected);
    }
}

#[tokio::test]
async fn test_profile_raw_json() {
    let (client, upstream) = start(API_KEY).await;

    let number = CompanyNumber::parse("00000006").unwrap();
    let value = client.get_company_profile(&number).await.unwrap();
    assert_eq!(value["company_number"], "00000006");
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_not_found_is_status_error() {
    let (client, upstream) = start(API_KEY).await;

    let number = CompanyNumber::parse("99999999").unwrap();
    let err = client
        .get_company_profile_as_table(&number)
        .await
        .unwrap_err();

    match err {
        Error::Status { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("company-profile-not-found"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_wrong_key_is_unauthorized() {
    let (client, _) = start("other-key").await;

    let number = CompanyNumber::parse("00000006").unwrap();
    let err = client.get_company_profile(&number).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_non_json_body_is_decode_error() {
    let (client, _) = start(API_KEY).await;

    let number = CompanyNumber::parse("88888888").unwrap();
    let err = client.get_company_profile(&number).await.unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}

#[tokio::test]
async fn test_advanced_search_sends_dates_and_builds_rows() {
    let (client, upstream) = start(API_KEY).await;

    let table = client.advanced_search_as_table(&may_2024()).await.unwrap();
    assert_eq!(table.num_rows(), 3);

    let query = upstream.last_query.lock().unwrap().clone();
    assert_eq!(query.get("incorporated_from").map(String::as_str), Some("2024-05-06"));
    assert_eq!(query.get("incorporated_to").map(String::as_str), Some("2024-06-05"));
}

#[tokio::test]
async fn test_invalid_params_send_nothing() {
    let (client, upstream) = start(API_KEY).await;

    let params = AdvancedSearchParams {
        incorporated_from: NaiveDate::from_ymd_opt(2024, 6, 5),
        incorporated_to: NaiveDate::from_ymd_opt(2024, 5, 6),
        ..Default::default()
    };
    let err = client.advanced_search(&params).await.unwrap_err();

    assert!(matches!(err, Error::InvalidParams(_)));
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    let client = CompaniesHouseClient::new(&ApiSettings {
        api_key: API_KEY.to_string(),
        base_url: "http://127.0.0.1:1".to_string(),
    });

    let number = CompanyNumber::parse("00000006").unwrap();
    let err = client.get_company_profile(&number).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}
