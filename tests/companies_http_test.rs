mod common;

use axum::http::{Method, StatusCode};
use common::{id_of, TestApp};
use serde_json::json;

#[tokio::test]
async fn company_crud_round() {
    let app = TestApp::new().await;
    let (user_id, token) = app.register("owner@example.com").await;

    let created = app
        .json(
            Method::POST,
            "/companies",
            Some(json!({
                "name": "Acme Electronics Ltd.",
                "address": "123 Tech Street, Silicon Valley, CA 94000",
                "email": "info@acme-electronics.com",
                "tax_id": "EIN-12-3456789",
            })),
            Some(&token),
            StatusCode::CREATED,
        )
        .await;
    let id = id_of(&created);
    assert_eq!(created["user_id"], user_id);
    assert_eq!(created["tax_id"], "EIN-12-3456789");

    let fetched = app
        .json(
            Method::GET,
            &format!("/companies/{id}"),
            None,
            Some(&token),
            StatusCode::OK,
        )
        .await;
    assert_eq!(fetched["name"], "Acme Electronics Ltd.");

    let updated = app
        .json(
            Method::PUT,
            &format!("/companies/{id}"),
            Some(json!({ "phone": "+1-555-0100" })),
            Some(&token),
            StatusCode::OK,
        )
        .await;
    assert_eq!(updated["phone"], "+1-555-0100");
    assert_eq!(updated["name"], "Acme Electronics Ltd.");

    let deleted = app
        .json(
            Method::DELETE,
            &format!("/companies/{id}"),
            None,
            Some(&token),
            StatusCode::OK,
        )
        .await;
    assert_eq!(deleted["message"], "Company deleted successfully");

    let gone = app
        .json(
            Method::GET,
            &format!("/companies/{id}"),
            None,
            Some(&token),
            StatusCode::NOT_FOUND,
        )
        .await;
    assert_eq!(gone["detail"], "Company not found");
}

#[tokio::test]
async fn company_list_is_scoped_and_searchable() {
    let app = TestApp::new().await;
    let (_, alice) = app.register("alice@example.com").await;
    let (_, bob) = app.register("bob@example.com").await;

    app.create_company(&alice, "Acme Electronics Ltd.").await;
    app.create_company(&alice, "Global Components Inc.").await;
    app.create_company(&bob, "Bob's Parts").await;

    let listed = app
        .json(Method::GET, "/companies", None, Some(&alice), StatusCode::OK)
        .await;
    let names: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Global Components Inc.", "Acme Electronics Ltd."]);

    let searched = app
        .json(
            Method::GET,
            "/companies?search=acme",
            None,
            Some(&alice),
            StatusCode::OK,
        )
        .await;
    assert_eq!(searched.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn foreign_company_is_not_found() {
    let app = TestApp::new().await;
    let (_, alice) = app.register("alice@example.com").await;
    let (_, bob) = app.register("bob@example.com").await;
    let company_id = app.create_company(&alice, "Acme Electronics Ltd.").await;

    for method in [Method::GET, Method::DELETE] {
        let body = app
            .json(
                method,
                &format!("/companies/{company_id}"),
                None,
                Some(&bob),
                StatusCode::NOT_FOUND,
            )
            .await;
        assert_eq!(body["detail"], "Company not found");
    }

    app.json(
        Method::PUT,
        &format!("/companies/{company_id}"),
        Some(json!({ "name": "Mine now" })),
        Some(&bob),
        StatusCode::NOT_FOUND,
    )
    .await;

    app.json(
        Method::GET,
        &format!("/companies/{company_id}"),
        None,
        Some(&alice),
        StatusCode::OK,
    )
    .await;
}

#[tokio::test]
async fn company_input_is_validated() {
    let app = TestApp::new().await;
    let (_, token) = app.register("owner@example.com").await;

    app.json(
        Method::POST,
        "/companies",
        Some(json!({ "name": "" })),
        Some(&token),
        StatusCode::BAD_REQUEST,
    )
    .await;
    app.json(
        Method::POST,
        "/companies",
        Some(json!({ "name": "Acme", "email": "nope" })),
        Some(&token),
        StatusCode::BAD_REQUEST,
    )
    .await;
    app.json(
        Method::GET,
        "/companies/abc",
        None,
        Some(&token),
        StatusCode::BAD_REQUEST,
    )
    .await;
}
