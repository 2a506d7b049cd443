//! Visitas e o fluxo de reconciliação com clientes.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get, login, post_json};
use serde_json::{json, Value};

fn visit_body(place_name: &str, timestamp: i64, duration: i32) -> Value {
    json!({
        "placeId": "place-1",
        "placeName": place_name,
        "placeAddress": "Calle Mayor 1, Madrid",
        "timestamp": timestamp,
        "feedback": "Quieren probar la nueva carta",
        "status": "propuesta",
        "tags": ["hostelería"],
        "location": { "lat": 40.41, "lng": -3.70 },
        "durationMinutes": duration
    })
}

#[tokio::test]
async fn visits_are_listed_newest_first_with_attachments() {
    let app = build_test_app().await;
    let token = login(&app, "comercial", "password").await;

    let mut older = visit_body("Bar A", 1_000, 10);
    older["expensesAdded"] = json!([{ "amount": 3.5, "concept": "Café", "date": 1_000 }]);
    older["voiceNotes"] = json!([{ "name": "nota", "type": "audio", "date": 1_000, "data": "UklGRg==" }]);

    let created = post_json(&app, "/api/visits", &token, older).await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = body_json(created).await;
    assert_eq!(created["expensesAdded"][0]["visitId"], created["id"]);

    post_json(&app, "/api/visits", &token, visit_body("Bar B", 2_000, 5)).await;

    let list = body_json(get(&app, "/api/visits", &token).await).await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["placeName"], "Bar B");
    assert_eq!(list[1]["placeName"], "Bar A");
    assert_eq!(list[1]["expensesAdded"].as_array().unwrap().len(), 1);
    assert_eq!(list[1]["voiceNotes"][0]["type"], "audio");
}

#[tokio::test]
async fn invalid_status_is_rejected() {
    let app = build_test_app().await;
    let token = login(&app, "comercial", "password").await;

    let mut body = visit_body("Bar", 1, 1);
    body["status"] = json!("ganado");

    let response = post_json(&app, "/api/visits", &token, body).await;
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn recording_a_visit_creates_the_client_once() {
    let app = build_test_app().await;
    let token = login(&app, "comercial", "password").await;

    let first = post_json(
        &app,
        "/api/visits/record",
        &token,
        json!({
            "visit": visit_body("Bar Manolo", 1_000, 20),
            "clientUpdate": { "contactName": "Manolo", "phones": ["600111222"] }
        }),
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let first = body_json(first).await;
    assert_eq!(first["clientCreated"], true);
    assert_eq!(first["client"]["name"], "Bar Manolo");
    assert_eq!(first["client"]["totalTimeSpentMinutes"], 20);
    assert_eq!(first["visit"]["clientId"], first["client"]["id"]);

    // Mesmo lugar sem clientId: achado pelo nome
    let second = post_json(
        &app,
        "/api/visits/record",
        &token,
        json!({
            "visit": visit_body("Bar Manolo", 2_000, 15),
            "clientUpdate": { "phones": ["600111222", "911222333"], "emails": ["bar@manolo.es"] }
        }),
    )
    .await;
    assert_eq!(second.status(), StatusCode::CREATED);
    let second = body_json(second).await;
    assert_eq!(second["clientCreated"], false);
    assert_eq!(second["client"]["id"], first["client"]["id"]);
    assert_eq!(second["client"]["totalTimeSpentMinutes"], 35);
    assert_eq!(second["client"]["phones"], json!(["600111222", "911222333"]));
    assert_eq!(second["client"]["emails"], json!(["bar@manolo.es"]));
    assert_eq!(second["client"]["contactName"], "Manolo");
    assert_eq!(second["client"]["visitIds"].as_array().unwrap().len(), 2);

    let clients = body_json(get(&app, "/api/clients", &token).await).await;
    assert_eq!(clients.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn recorded_visit_attachments_land_in_the_folder() {
    let app = build_test_app().await;
    let token = login(&app, "comercial", "password").await;

    let mut visit = visit_body("Bodega Luis", 5_000, 30);
    visit["expensesAdded"] = json!([{ "amount": 12.5, "concept": "Comida", "date": 5_000 }]);
    visit["documentsAdded"] = json!([{ "name": "Pedido", "type": "doc", "date": 5_000 }]);

    let recorded = body_json(
        post_json(&app, "/api/visits/record", &token, json!({ "visit": visit })).await,
    )
    .await;
    let client_id = recorded["client"]["id"].as_str().unwrap();

    post_json(
        &app,
        &format!("/api/clients/{client_id}/expenses"),
        &token,
        json!({ "amount": 7.5, "concept": "Parking", "date": 6_000 }),
    )
    .await;

    let folder = body_json(get(&app, &format!("/api/clients/{client_id}/folder"), &token).await).await;
    assert_eq!(folder["visits"].as_array().unwrap().len(), 1);
    assert_eq!(folder["expenses"].as_array().unwrap().len(), 2);
    assert_eq!(folder["expenses"][0]["concept"], "Parking");
    assert_eq!(folder["documents"].as_array().unwrap().len(), 1);
    assert_eq!(folder["totalExpenses"], 20.0);

    // Despesa da visita não aparece como despesa do cliente
    let client = body_json(get(&app, &format!("/api/clients/{client_id}"), &token).await).await;
    assert_eq!(client["expenses"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn recording_the_same_visit_id_twice_is_a_conflict() {
    let app = build_test_app().await;
    let token = login(&app, "comercial", "password").await;

    let mut visit = visit_body("Taberna Pepe", 1_000, 25);
    visit["id"] = json!("0b8f4c2e-6a1d-4f7e-9c3b-2d5e8a7f1c40");
    let body = json!({ "visit": visit });

    let first = body_json(post_json(&app, "/api/visits/record", &token, body.clone()).await).await;
    let client_id = first["client"]["id"].as_str().unwrap().to_string();
    assert_eq!(first["client"]["totalTimeSpentMinutes"], 25);

    let again = post_json(&app, "/api/visits/record", &token, body).await;
    assert_eq!(again.status(), StatusCode::CONFLICT);

    let client = body_json(get(&app, &format!("/api/clients/{client_id}"), &token).await).await;
    assert_eq!(client["totalTimeSpentMinutes"], 25);
    assert_eq!(client["visitIds"].as_array().unwrap().len(), 1);

    let visits = body_json(get(&app, "/api/visits", &token).await).await;
    assert_eq!(visits.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn new_client_takes_identity_from_the_visit() {
    let app = build_test_app().await;
    let token = login(&app, "comercial", "password").await;

    let recorded = post_json(
        &app,
        "/api/visits/record",
        &token,
        json!({
            "visit": visit_body("Cervecería Sol", 1_000, 10),
            "clientUpdate": {
                "name": "Nombre Inventado",
                "address": "Otra calle",
                "contactName": "Rosa",
                "emails": ["rosa@sol.es"]
            }
        }),
    )
    .await;
    assert_eq!(recorded.status(), StatusCode::CREATED);

    let recorded = body_json(recorded).await;
    assert_eq!(recorded["clientCreated"], true);
    assert_eq!(recorded["client"]["name"], "Cervecería Sol");
    assert_eq!(recorded["client"]["address"], "Calle Mayor 1, Madrid");
    assert_eq!(recorded["client"]["location"]["lat"], 40.41);
    assert_eq!(recorded["client"]["contactName"], "Rosa");
    assert_eq!(recorded["client"]["emails"], json!(["rosa@sol.es"]));
}
