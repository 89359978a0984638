use qrorder_core::{ApiErrorClass, SheetsClient};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn get_values_returns_rows() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-1/values/MESSAGE_MAP"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "MESSAGE_MAP!A1:D2",
            "majorDimension": "ROWS",
            "values": [
                ["UNKNOWN", "QR_ORDER", "4521", "2024-01-05 10:00:00"],
                ["UNKNOWN", "QR_ORDER", "8123", "2024-01-06 11:30:00"]
            ]
        })))
        .mount(&server)
        .await;

    let client = SheetsClient::with_base_url(&server.uri(), "test-token").unwrap();
    let range = client.get_values("sheet-1", "MESSAGE_MAP").await.unwrap();

    assert_eq!(range.values.len(), 2);
    assert_eq!(range.values[0][2], "4521");
    assert_eq!(range.major_dimension.as_deref(), Some("ROWS"));
}

#[tokio::test]
async fn get_values_defaults_to_empty_when_values_omitted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-1/values/MESSAGE_MAP"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "MESSAGE_MAP!A1:D1",
            "majorDimension": "ROWS"
        })))
        .mount(&server)
        .await;

    let client = SheetsClient::with_base_url(&server.uri(), "test-token").unwrap();
    let range = client.get_values("sheet-1", "MESSAGE_MAP").await.unwrap();

    assert!(range.values.is_empty());
}

#[tokio::test]
async fn get_values_encodes_worksheet_titles_with_spaces() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-1/values/ORDER%20LOG"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "'ORDER LOG'!A1:D1",
            "values": []
        })))
        .mount(&server)
        .await;

    let client = SheetsClient::with_base_url(&server.uri(), "test-token").unwrap();
    let range = client.get_values("sheet-1", "ORDER LOG").await.unwrap();

    assert!(range.values.is_empty());
}

#[tokio::test]
async fn append_row_posts_raw_values() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet-1/values/MESSAGE_MAP:append"))
        .and(query_param("valueInputOption", "RAW"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_string_contains("QR_ORDER"))
        .and(body_string_contains("4521"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "spreadsheetId": "sheet-1",
            "tableRange": "MESSAGE_MAP!A1:D3",
            "updates": {
                "updatedRange": "MESSAGE_MAP!A4:D4",
                "updatedRows": 1,
                "updatedColumns": 4,
                "updatedCells": 4
            }
        })))
        .mount(&server)
        .await;

    let client = SheetsClient::with_base_url(&server.uri(), "test-token").unwrap();
    let row = vec![
        "UNKNOWN".to_string(),
        "QR_ORDER".to_string(),
        "4521".to_string(),
        "2024-01-05 10:00:00".to_string(),
    ];
    let response = client.append_row("sheet-1", "MESSAGE_MAP", &row).await.unwrap();

    assert_eq!(response.spreadsheet_id, "sheet-1");
    assert_eq!(response.updates.updated_rows, 1);
    assert_eq!(response.updates.updated_cells, 4);
}

#[tokio::test]
async fn api_errors_classify_by_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-1/values/MESSAGE_MAP"))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
        .mount(&server)
        .await;

    let client = SheetsClient::with_base_url(&server.uri(), "test-token").unwrap();
    let err = client
        .get_values("sheet-1", "MESSAGE_MAP")
        .await
        .expect_err("expected error");

    assert_eq!(err.classification(), Some(ApiErrorClass::Transient));
    assert!(err.is_retryable());
}
