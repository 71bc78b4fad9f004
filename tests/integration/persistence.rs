//! Rows, content and uploaded images survive a restart.

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, StatusCode};
use hf_integration_tests::{TestSite, body_json, login, send, send_json, upload};
use tower::ServiceExt;
use hf_site::{EquipmentDraft, MaterialDraft};
use hf_types::{ContentSection, MaterialKind};
use serde_json::json;

#[tokio::test]
async fn test_rows_survive_reopen() {
    let site = TestSite::new();
    let dashboard = &site.site.dashboard;

    let excavator = dashboard
        .equipment
        .create(&EquipmentDraft {
            name: "Excavator X200".into(),
            equipment_type: "excavator".into(),
            rental_price_per_day: "250.00".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    dashboard
        .materials(MaterialKind::Structural)
        .create(&MaterialDraft {
            name: "Rebar 12mm".into(),
            category: "rebar".into(),
            price_per_unit: "980".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    dashboard
        .content
        .save(ContentSection::ContactInfo, "+44 1234 567890")
        .await
        .unwrap();

    let site = site.reopen();
    let dashboard = &site.site.dashboard;

    let equipment = dashboard.equipment.list().await.unwrap();
    assert_eq!(equipment.len(), 1);
    assert_eq!(equipment[0].id, excavator.id);
    assert_eq!(equipment[0].rental_price_per_day, Some(250.0));

    let rebar = dashboard.structural_materials.list().await.unwrap();
    assert_eq!(rebar.len(), 1);
    assert_eq!(rebar[0].unit, "ton");
    assert!(dashboard.construction_materials.list().await.unwrap().is_empty());

    let page = site.site.public.page().await.unwrap();
    assert_eq!(page.contact_info.as_deref(), Some("+44 1234 567890"));
}

#[tokio::test]
async fn test_seeding_is_idempotent_across_restarts() {
    let site = TestSite::new();
    assert_eq!(site.site.dashboard.content.seed_defaults().await.unwrap(), 3);
    site.site
        .dashboard
        .content
        .save(ContentSection::Hero, "Heavy lifting, done right")
        .await
        .unwrap();

    let site = site.reopen();
    assert_eq!(site.site.dashboard.content.seed_defaults().await.unwrap(), 0);

    let hero = site.site.public.hero().await.unwrap();
    assert_eq!(hero.title, "H&F Ltd");
    assert_eq!(hero.text, "Heavy lifting, done right");
}

#[tokio::test]
async fn test_logo_upload_survives_reopen() {
    let site = TestSite::new();
    let app = site.router();
    let token = login(&app).await;

    let png = b"\x89PNG\r\n\x1a\nlogo-bytes";
    let url = upload(&app, &token, "branding", "site.png", png).await;
    assert!(url.starts_with("http://hf.test/storage/hf-images/branding/"), "{url}");

    send_json(
        &app,
        "PUT",
        "/admin/api/logo",
        Some(&token),
        Some(json!({ "url": url })),
        StatusCode::OK,
    )
    .await;

    let site = site.reopen();
    let app = site.router();

    let page = send_json(&app, "GET", "/api/site", None, None, StatusCode::OK).await;
    assert_eq!(page["logo_url"], url.as_str());

    let response = send(&app, "GET", TestSite::path_of(&url), None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    let bytes = http_body_util::BodyExt::collect(response.into_body())
        .await
        .unwrap()
        .to_bytes();
    assert_eq!(bytes, bytes::Bytes::from_static(png));
}

#[tokio::test]
async fn test_unnamed_upload_keeps_its_content_type() {
    let site = TestSite::new();
    let app = site.router();
    let token = login(&app).await;

    let request = Request::builder()
        .method("POST")
        .uri("/admin/api/uploads?folder=gallery")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(CONTENT_TYPE, "image/png")
        .body(Body::from(&b"\x89PNG\r\n\x1a\nyard"[..]))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let url = body_json(response).await["url"].as_str().unwrap().to_string();
    assert!(!url.rsplit('/').next().unwrap().contains('.'), "{url}");

    let site = site.reopen();
    let app = site.router();
    let response = send(&app, "GET", TestSite::path_of(&url), None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
}

#[tokio::test]
async fn test_deleted_rows_stay_deleted() {
    let site = TestSite::new();
    let app = site.router();
    let token = login(&app).await;

    let kept = send_json(
        &app,
        "POST",
        "/admin/api/gallery",
        Some(&token),
        Some(json!({ "image_url": "https://cdn.example/yard.jpg", "title": "Yard" })),
        StatusCode::CREATED,
    )
    .await;
    let dropped = send_json(
        &app,
        "POST",
        "/admin/api/gallery",
        Some(&token),
        Some(json!({ "image_url": "https://cdn.example/old.jpg" })),
        StatusCode::CREATED,
    )
    .await;

    let response = send(
        &app,
        "DELETE",
        &format!("/admin/api/gallery/{}", dropped["id"].as_str().unwrap()),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let site = site.reopen();
    let app = site.router();
    let gallery = body_json(send(&app, "GET", "/api/gallery", None, None).await).await;
    let items = gallery.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], kept["id"]);
    assert_eq!(items[0]["alt"], "Yard");
}
