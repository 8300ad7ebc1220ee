//! Pricing rule management integration tests.

mod common;

use common::{dec, decimal, fixed_rule, multiplier_rule, static_rule, TestApp};
use serde_json::{json, Value};

#[tokio::test]
async fn create_and_get_rule() {
    let app = TestApp::spawn().await;

    let created = app.create_rule(multiplier_rule(1, 10, 1500.0)).await;
    let id = created["id"].as_i64().expect("id missing");

    assert_eq!(created["pricing_type"], "vehicle_class_multiplier");
    assert_eq!(decimal(&created["base_price"]), dec("1500"));
    assert_eq!(decimal(&created["vehicle_class_multipliers"]["C"]), dec("1.5"));
    assert!(created.get("vehicle_class_prices").is_none());

    let response = app
        .client
        .get(app.url(&format!("/api/v1/pricing-rules/{}", id)))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let fetched: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(fetched["id"], created["id"]);
    assert_eq!(fetched["company_id"], 1);
    assert_eq!(fetched["service_id"], 10);
    assert_eq!(
        decimal(&fetched["vehicle_class_multipliers"]["E"]),
        dec("2")
    );
}

#[tokio::test]
async fn money_values_round_trip_exactly() {
    let app = TestApp::spawn().await;

    let body = r#"{
        "company_id": 1,
        "service_id": 11,
        "pricing_type": "vehicle_class_fixed",
        "base_price": 1234.5678901234567890123,
        "currency": "RUB",
        "vehicle_class_prices": {"C": 0.1000000000000000000001}
    }"#;
    let response = app
        .client
        .post(app.url("/api/v1/pricing-rules"))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let created: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(
        decimal(&created["base_price"]),
        dec("1234.5678901234567890123")
    );
    assert_eq!(
        decimal(&created["vehicle_class_prices"]["C"]),
        dec("0.1000000000000000000001")
    );
}

#[tokio::test]
async fn static_rule_with_multipliers_is_rejected() {
    let app = TestApp::spawn().await;

    let mut body = static_rule(1, 10, 1000.0);
    body["vehicle_class_multipliers"] = json!({ "C": 1.2 });

    let response = app.post_rule(&body).await;
    assert_eq!(response.status().as_u16(), 400);

    let error: Value = response.json().await.expect("Failed to parse JSON");
    assert!(error["error"]
        .as_str()
        .unwrap_or_default()
        .contains("vehicle_class_multipliers"));
}

#[tokio::test]
async fn unknown_pricing_type_is_rejected() {
    let app = TestApp::spawn().await;

    let mut body = static_rule(1, 10, 1000.0);
    body["pricing_type"] = json!("tiered");

    let response = app.post_rule(&body).await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn missing_base_price_is_rejected() {
    let app = TestApp::spawn().await;

    let mut body = fixed_rule(1, 10, 1000.0);
    body.as_object_mut().unwrap().remove("base_price");

    let response = app.post_rule(&body).await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn malformed_currency_fails_request_validation() {
    let app = TestApp::spawn().await;

    let mut body = static_rule(1, 10, 1000.0);
    body["currency"] = json!("RUBLES");

    let response = app.post_rule(&body).await;
    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn duplicate_rule_is_conflict() {
    let app = TestApp::spawn().await;

    app.create_rule(static_rule(1, 10, 1000.0)).await;
    let response = app.post_rule(&static_rule(1, 10, 2000.0)).await;
    assert_eq!(response.status().as_u16(), 409);

    // Another company may price the same service.
    app.create_rule(static_rule(2, 10, 2000.0)).await;
}

#[tokio::test]
async fn concurrent_duplicate_creates_have_one_winner() {
    let app = TestApp::spawn().await;

    let body = static_rule(1, 1, 1000.0);
    let (a, b) = tokio::join!(app.post_rule(&body), app.post_rule(&body));

    let mut statuses = vec![a.status().as_u16(), b.status().as_u16()];
    statuses.sort();
    assert_eq!(statuses, vec![201, 409]);
}

#[tokio::test]
async fn list_rules_filters_by_company() {
    let app = TestApp::spawn().await;

    app.create_rule(static_rule(1, 10, 100.0)).await;
    app.create_rule(static_rule(1, 20, 200.0)).await;
    app.create_rule(static_rule(2, 10, 300.0)).await;

    let response = app
        .client
        .get(app.url("/api/v1/pricing-rules?company_id=1"))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.expect("Failed to parse JSON");
    let rules = body["rules"].as_array().expect("rules missing");
    assert_eq!(rules.len(), 2);
    assert!(rules.iter().all(|r| r["company_id"] == 1));

    let body: Value = app
        .client
        .get(app.url("/api/v1/pricing-rules?company_id=1&service_id=20"))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(body["rules"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn update_rule_merges_patch() {
    let app = TestApp::spawn().await;

    let created = app.create_rule(multiplier_rule(1, 10, 1500.0)).await;
    let url = app.url(&format!("/api/v1/pricing-rules/{}", created["id"]));

    let response = app
        .client
        .put(&url)
        .json(&json!({ "base_price": 1800 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let updated: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(decimal(&updated["base_price"]), dec("1800"));
    assert_eq!(updated["pricing_type"], "vehicle_class_multiplier");
    assert_eq!(decimal(&updated["vehicle_class_multipliers"]["C"]), dec("1.5"));
}

#[tokio::test]
async fn update_clearing_multipliers_is_rejected() {
    let app = TestApp::spawn().await;

    let created = app.create_rule(multiplier_rule(1, 10, 1500.0)).await;
    let url = app.url(&format!("/api/v1/pricing-rules/{}", created["id"]));

    let response = app
        .client
        .put(&url)
        .json(&json!({ "vehicle_class_multipliers": {} }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn update_can_switch_to_fixed_prices() {
    let app = TestApp::spawn().await;

    let created = app.create_rule(multiplier_rule(1, 10, 1500.0)).await;
    let url = app.url(&format!("/api/v1/pricing-rules/{}", created["id"]));

    let response = app
        .client
        .put(&url)
        .json(&json!({
            "pricing_type": "vehicle_class_fixed",
            "vehicle_class_multipliers": {},
            "vehicle_class_prices": { "C": 2100 }
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let updated: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(updated["pricing_type"], "vehicle_class_fixed");
    assert!(updated.get("vehicle_class_multipliers").is_none());
    assert_eq!(decimal(&updated["vehicle_class_prices"]["C"]), dec("2100"));
}

#[tokio::test]
async fn update_missing_rule_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .put(app.url("/api/v1/pricing-rules/9999"))
        .json(&json!({ "base_price": 10 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn delete_rule_then_not_found() {
    let app = TestApp::spawn().await;

    let created = app.create_rule(static_rule(1, 10, 1000.0)).await;
    let url = app.url(&format!("/api/v1/pricing-rules/{}", created["id"]));

    let response = app
        .client
        .delete(&url)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 204);

    for _ in 0..2 {
        let response = app
            .client
            .delete(&url)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 404);
    }

    let response = app
        .client
        .get(&url)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);
}
