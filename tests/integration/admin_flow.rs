//! A full dashboard session over HTTP against persistent backends.

use std::sync::Arc;

use axum::http::StatusCode;
use hf_integration_tests::{TestSite, login, send, send_json};
use hf_meta::TableClient;
use hf_types::events::{Mutation, TableInvalidated};
use hf_types::TableName;
use serde_json::{Value, json};

#[tokio::test]
async fn test_every_table_create_list_update_delete() {
    let site = TestSite::new();
    let app = site.router();
    let token = login(&app).await;

    let cases: [(&str, Value, &str, Value); 5] = [
        (
            "equipment",
            json!({ "name": "Tipper Truck", "rental_price_per_day": "180" }),
            "rental_price_per_day",
            json!({ "name": "Tipper Truck", "rental_price_per_day": "" }),
        ),
        (
            "construction_materials",
            json!({ "name": "Sharp Sand", "category": "sand", "price_per_unit": "45.5" }),
            "price_per_unit",
            json!({ "name": "Sharp Sand", "category": "sand", "price_per_unit": "" }),
        ),
        (
            "structural_materials",
            json!({
                "name": "Cement 25kg",
                "category": "cement",
                "price_per_unit": 7,
                "unit": "bag",
            }),
            "price_per_unit",
            json!({ "name": "Cement 25kg", "category": "cement", "unit": "bag" }),
        ),
        (
            "promotions",
            json!({
                "title": "Spring",
                "description": "Gravel deals",
                "discount_percentage": "20",
            }),
            "discount_percentage",
            json!({ "title": "Spring", "description": "Gravel deals" }),
        ),
        (
            "gallery",
            json!({ "image_url": "https://cdn.example/a.jpg", "category": "projects" }),
            "category",
            json!({ "image_url": "https://cdn.example/a.jpg" }),
        ),
    ];

    for (table, create, cleared_field, update) in cases {
        let created = send_json(
            &app,
            "POST",
            &format!("/admin/api/{table}"),
            Some(&token),
            Some(create),
            StatusCode::CREATED,
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();
        assert!(!created[cleared_field].is_null(), "{table}");

        let listed = send_json(
            &app,
            "GET",
            &format!("/admin/api/{table}"),
            Some(&token),
            None,
            StatusCode::OK,
        )
        .await;
        assert_eq!(listed.as_array().unwrap().len(), 1, "{table}");
        assert_eq!(listed[0]["id"], id.as_str(), "{table}");

        // Empty optional fields are written back as null.
        let updated = send_json(
            &app,
            "PUT",
            &format!("/admin/api/{table}/{id}"),
            Some(&token),
            Some(update),
            StatusCode::OK,
        )
        .await;
        assert!(updated[cleared_field].is_null(), "{table}");
        assert_eq!(updated["id"], id.as_str(), "{table}");

        let response = send(
            &app,
            "DELETE",
            &format!("/admin/api/{table}/{id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT, "{table}");

        let response = send(
            &app,
            "GET",
            &format!("/admin/api/{table}/{id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{table}");
    }
}

#[tokio::test]
async fn test_update_touches_only_target_row() {
    let site = TestSite::new();
    let app = site.router();
    let token = login(&app).await;

    let mut ids = Vec::new();
    for name in ["Bulldozer", "Crane", "Dumper"] {
        let row = send_json(
            &app,
            "POST",
            "/admin/api/equipment",
            Some(&token),
            Some(json!({ "name": name, "type": "other" })),
            StatusCode::CREATED,
        )
        .await;
        ids.push(row["id"].as_str().unwrap().to_string());
    }

    send_json(
        &app,
        "PUT",
        &format!("/admin/api/equipment/{}", ids[1]),
        Some(&token),
        Some(json!({ "name": "Crane", "type": "other", "available": false })),
        StatusCode::OK,
    )
    .await;

    let public = send_json(&app, "GET", "/api/equipment", None, None, StatusCode::OK).await;
    let statuses: Vec<(&str, &str)> = public
        .as_array()
        .unwrap()
        .iter()
        .map(|e| (e["name"].as_str().unwrap(), e["status"].as_str().unwrap()))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("Bulldozer", "Available"),
            ("Crane", "Rented"),
            ("Dumper", "Available"),
        ]
    );
}

#[tokio::test]
async fn test_contact_requests_workflow() {
    let site = TestSite::new();
    let app = site.router();
    let token = login(&app).await;

    // Requests arrive from the public contact form, straight into the table.
    let client: &Arc<dyn TableClient> = site.site.dashboard.cache().client();
    let inserted = client
        .insert(
            TableName::ContactRequests,
            vec![
                json!({
                    "name": "Priya",
                    "email": "priya@example.com",
                    "phone": "07700 900123",
                    "message": "Quote for land levelling",
                    "status": "new",
                })
                .as_object()
                .cloned()
                .unwrap(),
            ],
        )
        .await
        .unwrap();
    let id = inserted[0]["id"].as_str().unwrap().to_string();

    let overview = send_json(&app, "GET", "/admin", Some(&token), None, StatusCode::OK).await;
    assert_eq!(overview["overview"]["new_contact_requests"], 1);

    let updated = send_json(
        &app,
        "PUT",
        &format!("/admin/api/contact_requests/{id}/status"),
        Some(&token),
        Some(json!({ "status": "in_progress" })),
        StatusCode::OK,
    )
    .await;
    assert_eq!(updated["status"], "in_progress");

    let listed = send_json(
        &app,
        "GET",
        "/admin/api/contact_requests",
        Some(&token),
        None,
        StatusCode::OK,
    )
    .await;
    assert_eq!(listed[0]["status"], "in_progress");

    let overview = send_json(&app, "GET", "/admin", Some(&token), None, StatusCode::OK).await;
    assert_eq!(overview["overview"]["new_contact_requests"], 0);
    assert_eq!(overview["overview"]["contact_requests"], 1);
}

#[tokio::test]
async fn test_content_tab_excludes_logo() {
    let site = TestSite::new();
    let app = site.router();
    let token = login(&app).await;
    site.site.dashboard.content.seed_defaults().await.unwrap();

    send_json(
        &app,
        "PUT",
        "/admin/api/logo",
        Some(&token),
        Some(json!({ "url": "https://cdn.example/logo.svg" })),
        StatusCode::OK,
    )
    .await;

    let blocks = send_json(
        &app,
        "GET",
        "/admin/api/content",
        Some(&token),
        None,
        StatusCode::OK,
    )
    .await;
    let sections: Vec<&str> = blocks
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["section"].as_str().unwrap())
        .collect();
    assert_eq!(sections, vec!["about", "hero", "mission"]);

    let logo = send_json(&app, "GET", "/admin/api/logo", Some(&token), None, StatusCode::OK).await;
    assert_eq!(logo["content"], "https://cdn.example/logo.svg");

    // Clearing the logo falls back to the text brand.
    send_json(
        &app,
        "PUT",
        "/admin/api/logo",
        Some(&token),
        Some(json!({ "url": "" })),
        StatusCode::OK,
    )
    .await;
    let page = send_json(&app, "GET", "/api/site", None, None, StatusCode::OK).await;
    assert!(page["logo_url"].is_null());
}

#[tokio::test]
async fn test_writes_announce_invalidation() {
    let site = TestSite::new();
    let app = site.router();
    let token = login(&app).await;
    let mut events = site.site.bus.subscribe::<TableInvalidated>();

    let row = send_json(
        &app,
        "POST",
        "/admin/api/promotions",
        Some(&token),
        Some(json!({ "title": "Bulk", "description": "10 tons or more" })),
        StatusCode::CREATED,
    )
    .await;
    send(
        &app,
        "DELETE",
        &format!("/admin/api/promotions/{}", row["id"].as_str().unwrap()),
        Some(&token),
        None,
    )
    .await;

    let first = events.try_recv().unwrap();
    assert_eq!(first.table, TableName::Promotions);
    assert_eq!(first.mutation, Mutation::Insert);
    let second = events.try_recv().unwrap();
    assert_eq!(second.mutation, Mutation::Delete);
    assert!(events.try_recv().is_none());
}

#[tokio::test]
async fn test_failed_validation_writes_nothing() {
    let site = TestSite::new();
    let app = site.router();
    let token = login(&app).await;
    let mut events = site.site.bus.subscribe::<TableInvalidated>();

    let body = send_json(
        &app,
        "POST",
        "/admin/api/promotions",
        Some(&token),
        Some(json!({ "title": "Too good", "description": "x", "discount_percentage": "150" })),
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;
    assert_eq!(body["error"], "validation_failed");
    assert!(events.try_recv().is_none());

    let listed = send_json(
        &app,
        "GET",
        "/admin/api/promotions",
        Some(&token),
        None,
        StatusCode::OK,
    )
    .await;
    assert_eq!(listed, json!([]));
}
