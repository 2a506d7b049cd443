//! Painel de métricas do admin.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get, login, post_json};
use serde_json::json;

#[tokio::test]
async fn empty_pipeline_has_zero_close_rate() {
    let app = build_test_app().await;
    let token = login(&app, "admin", "adminpassword").await;

    let response = get(&app, "/api/metrics", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["totalVisits"], 0);
    assert_eq!(json["closeRate"], 0);
}

#[tokio::test]
async fn metrics_count_visits_by_status() {
    let app = build_test_app().await;
    let comercial = login(&app, "comercial", "password").await;
    let admin = login(&app, "admin", "adminpassword").await;

    for (i, status) in ["aceptado", "rechazado", "propuesta"].into_iter().enumerate() {
        let response = post_json(
            &app,
            "/api/visits/record",
            &comercial,
            json!({
                "visit": {
                    "placeName": format!("Bar {i}"),
                    "timestamp": i,
                    "status": status,
                    "durationMinutes": 20,
                    "expensesAdded": [{ "amount": 10, "concept": "Café", "date": i }]
                }
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let json = body_json(get(&app, "/api/metrics", &admin).await).await;
    assert_eq!(json["totalClients"], 3);
    assert_eq!(json["totalVisits"], 3);
    assert_eq!(json["accepted"], 1);
    assert_eq!(json["rejected"], 1);
    assert_eq!(json["proposals"], 1);
    assert_eq!(json["closeRate"], 33);
    assert_eq!(json["totalMinutes"], 60);
    assert_eq!(json["totalExpenses"], 30.0);
}
