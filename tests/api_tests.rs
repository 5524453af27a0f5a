//! Call Boundary Tests
//!
//! Every operation goes through `dispatch` and comes back as the
//! `{status, data | error, timestamp}` envelope.

use serde_json::{json, Value as Json};

use ncr_analytics::{
    dispatch, AnalyticsEngine, Column, ColumnKind, Dataset, DatasetStore, Operation, RequestParams, Value,
};

fn plant_store() -> DatasetStore {
    let columns = vec![
        Column::new("timestamp", ColumnKind::Datetime),
        Column::new("machine_id", ColumnKind::Identifier),
        Column::new("ncr_type", ColumnKind::Categorical),
        Column::new("temperature", ColumnKind::Numeric),
        Column::new("pressure", ColumnKind::Numeric),
        Column::new("defect_count", ColumnKind::Numeric),
    ];
    let rows = (0..120u32)
        .map(|i| {
            let dimensional = i % 4 == 0;
            let ts = chrono::NaiveDate::from_ymd_opt(2024, 4, 1 + i % 20)
                .unwrap()
                .and_hms_opt(i % 24, 0, 0)
                .unwrap();
            vec![
                Value::from(ts),
                Value::from(if dimensional { "M3" } else { ["M1", "M2", "M4"][(i % 3) as usize] }),
                Value::from(if dimensional { "Dimensional" } else { "Surface" }),
                Value::from(68.0 + (i % 5) as f64 + if dimensional { 10.0 } else { 0.0 }),
                Value::from(100.0 + (i % 7) as f64),
                Value::from((i % 3) as f64 + if dimensional { 4.0 } else { 0.0 }),
            ]
        })
        .collect();
    let store = DatasetStore::new();
    store.load(Dataset::from_rows(columns, rows).unwrap());
    store
}

fn params(raw: Json) -> RequestParams {
    serde_json::from_value(raw).unwrap()
}

async fn call(store: &DatasetStore, operation: Operation, raw: Json) -> Json {
    dispatch(&AnalyticsEngine::default(), store, operation, &params(raw)).await
}

fn assert_success(response: &Json) {
    assert_eq!(response["status"], "success", "{response}");
    assert!(response["timestamp"].is_string());
    assert!(response.get("error").is_none());
}

fn assert_error(response: &Json, code: &str) {
    assert_eq!(response["status"], "error", "{response}");
    assert_eq!(response["error"]["code"], code);
    assert!(response["error"]["message"].is_string());
    assert!(response.get("data").is_none());
}

// ============================================================================
// Success paths
// ============================================================================

#[tokio::test]
async fn every_operation_succeeds_on_plant_data() {
    let store = plant_store();
    for operation in Operation::ALL {
        let raw = match operation {
            Operation::AnomalyFeatures => json!({ "index": 0 }),
            Operation::RootCause | Operation::Actions => json!({ "issue_type": "Dimensional" }),
            _ => json!({}),
        };
        let response = call(&store, operation, raw).await;
        assert_success(&response);
    }
}

#[tokio::test]
async fn time_series_groups_by_day() {
    let response = call(
        &plant_store(),
        Operation::TimeSeries,
        json!({ "column": "temperature", "group_by": "day", "start_date": "2024-04-01", "end_date": "2024-04-05T23:00:00" }),
    )
    .await;
    assert_success(&response);
    assert_eq!(response["data"]["group_by"], "day");
}

#[tokio::test]
async fn sample_respects_limit() {
    let response = call(&plant_store(), Operation::Sample, json!({ "limit": 3 })).await;
    assert_success(&response);
    assert_eq!(response["data"]["count"], 3);
    assert_eq!(response["data"]["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn root_cause_filters_scope_issues() {
    let response = call(
        &plant_store(),
        Operation::RootCause,
        json!({ "issue_type": "Dimensional", "filters": { "machine_id": "M3" } }),
    )
    .await;
    assert_success(&response);
    assert_eq!(response["data"]["total_issues"], 30);
}

#[tokio::test]
async fn actions_target_the_top_cause() {
    let response = call(&plant_store(), Operation::Actions, json!({ "issue_type": "Dimensional" })).await;
    assert_success(&response);
    let actions = response["data"]["actions"].as_array().unwrap();
    assert!(!actions.is_empty());
    for action in actions {
        assert!(["high", "medium", "low"].contains(&action["priority"].as_str().unwrap()));
        assert!(!action["steps"].as_array().unwrap().is_empty());
    }
}

// ============================================================================
// Error paths
// ============================================================================

#[tokio::test]
async fn no_dataset_loaded() {
    let response = call(&DatasetStore::new(), Operation::Dashboard, json!({})).await;
    assert_error(&response, "NO_DATA_LOADED");
}

#[tokio::test]
async fn cleared_store_reports_no_data() {
    let store = plant_store();
    store.clear();
    let response = call(&store, Operation::Overview, json!({})).await;
    assert_error(&response, "NO_DATA_LOADED");
}

#[tokio::test]
async fn invalid_parameters_are_rejected() {
    let store = plant_store();
    assert_error(
        &call(&store, Operation::Correlations, json!({ "threshold": -0.1 })).await,
        "INVALID_PARAMETER",
    );
    assert_error(
        &call(&store, Operation::Anomalies, json!({ "limit": 0 })).await,
        "INVALID_PARAMETER",
    );
    assert_error(
        &call(&store, Operation::TimeSeries, json!({ "group_by": "fortnight" })).await,
        "INVALID_PARAMETER",
    );
    assert_error(
        &call(&store, Operation::RootCause, json!({ "start_date": "soon" })).await,
        "INVALID_PARAMETER",
    );
}

#[tokio::test]
async fn inverted_range_is_rejected() {
    let response = call(
        &plant_store(),
        Operation::TimeSeries,
        json!({ "start_date": "2024-04-10", "end_date": "2024-04-01" }),
    )
    .await;
    assert_error(&response, "INVALID_RANGE");
}

#[tokio::test]
async fn unknown_and_mistyped_columns() {
    let store = plant_store();
    assert_error(
        &call(&store, Operation::TimeSeries, json!({ "column": "viscosity" })).await,
        "UNKNOWN_COLUMN",
    );
    assert_error(
        &call(&store, Operation::TimeSeries, json!({ "column": "ncr_type" })).await,
        "INVALID_COLUMN_KIND",
    );
    assert_error(
        &call(&store, Operation::Insights, json!({ "filters": { "plant": "North" } })).await,
        "UNKNOWN_COLUMN",
    );
}
