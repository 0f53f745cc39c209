//! HTTP-level tests of the full router

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;

use super::build_router;
use crate::api::AppState;
use crate::config::AuthConfig;
use crate::db::{create_test_pool, migrations};
use crate::models::{CreateUserInput, UserRole};
use crate::services::user::tests::CapturingSender;
use crate::services::AuthRateLimiter;

struct TestApp {
    server: TestServer,
    state: AppState,
    sender: Arc<CapturingSender>,
}

impl TestApp {
    async fn new() -> Self {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let sender = Arc::new(CapturingSender::default());
        let state = AppState::new(
            pool,
            sender.clone(),
            AuthRateLimiter::new(),
            &AuthConfig::default(),
        );
        let router = build_router(state.clone(), "*").expect("Failed to build router");
        let server = TestServer::new(router).expect("Failed to start test server");

        Self {
            server,
            state,
            sender,
        }
    }

    /// Run the email-code flow and return the session token
    async fn sign_in(&self, email: &str, username: &str) -> String {
        self.server
            .post("/api/v1/auth/email")
            .json(&json!({"email": email, "username": username}))
            .await
            .assert_status_ok();

        let code = self.sender.last_code(email).await;
        let response = self
            .server
            .post("/api/v1/auth/token")
            .json(&json!({"email": email, "confirmation_code": code}))
            .await;
        response.assert_status_ok();
        response.json::<Value>()["token"]
            .as_str()
            .expect("token missing")
            .to_string()
    }

    async fn admin_token(&self) -> String {
        self.state
            .user_service
            .create(CreateUserInput {
                username: "root".to_string(),
                email: "root@shelter.test".to_string(),
                role: Some(UserRole::Admin),
                ..Default::default()
            })
            .await
            .unwrap();
        self.sign_in("root@shelter.test", "root").await
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> Value {
        let response = self
            .server
            .post(path)
            .authorization_bearer(token)
            .json(&body)
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()
    }
}

#[tokio::test]
async fn test_email_code_sign_in_flow() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/api/v1/auth/email")
        .json(&json!({"email": "anna@shelter.test", "username": "anna"}))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({"email": "anna@shelter.test", "username": "anna"})
    );

    let wrong = app
        .server
        .post("/api/v1/auth/token")
        .json(&json!({"email": "anna@shelter.test", "confirmation_code": "not-it"}))
        .await;
    wrong.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        wrong.json::<Value>()["error"]["details"]["field"],
        "confirmation_code"
    );

    let code = app.sender.last_code("anna@shelter.test").await;
    let token = app
        .server
        .post("/api/v1/auth/token")
        .json(&json!({"email": "anna@shelter.test", "confirmation_code": code}))
        .await;
    token.assert_status_ok();
    let token = token.json::<Value>()["token"].as_str().unwrap().to_string();

    let me = app
        .server
        .get("/api/v1/users/me")
        .authorization_bearer(&token)
        .await;
    me.assert_status_ok();
    assert_eq!(me.json::<Value>()["username"], "anna");

    // The code was consumed
    app.server
        .post("/api/v1/auth/token")
        .json(&json!({"email": "anna@shelter.test", "confirmation_code": code}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_token_for_unknown_email_is_not_found() {
    let app = TestApp::new().await;

    app.server
        .post("/api/v1/auth/token")
        .json(&json!({"email": "ghost@shelter.test", "confirmation_code": "123456"}))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_email_with_other_username_conflicts() {
    let app = TestApp::new().await;
    app.sign_in("anna@shelter.test", "anna").await;

    app.server
        .post("/api/v1/auth/email")
        .json(&json!({"email": "anna@shelter.test", "username": "someone"}))
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_logout_invalidates_token() {
    let app = TestApp::new().await;
    let token = app.sign_in("anna@shelter.test", "anna").await;

    app.server
        .post("/api/v1/auth/logout")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    app.server
        .get("/api/v1/users/me")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_writes_need_admin() {
    let app = TestApp::new().await;
    let body = json!({"name": "Russia"});

    app.server
        .post("/api/v1/countries")
        .json(&body)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let user_token = app.sign_in("anna@shelter.test", "anna").await;
    app.server
        .post("/api/v1/countries")
        .authorization_bearer(&user_token)
        .json(&body)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.server
        .get("/api/v1/users")
        .authorization_bearer(&user_token)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let admin_token = app.admin_token().await;
    app.post("/api/v1/countries", &admin_token, body).await;

    // Reads stay public
    app.server.get("/api/v1/countries/russia").await.assert_status_ok();
}

#[tokio::test]
async fn test_non_admin_cannot_promote_self() {
    let app = TestApp::new().await;
    let token = app.sign_in("anna@shelter.test", "anna").await;

    app.server
        .patch("/api/v1/users/me")
        .authorization_bearer(&token)
        .json(&json!({"role": "admin"}))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = app
        .server
        .patch("/api/v1/users/me")
        .authorization_bearer(&token)
        .json(&json!({"bio": "Loves cats", "first_name": "Anna"}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["bio"], "Loves cats");
}

#[tokio::test]
async fn test_catalog_endpoints() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    app.post("/api/v1/countries", &token, json!({"name": "Russia"})).await;
    let town = app
        .post("/api/v1/towns", &token, json!({"name": "Kazan", "country": "russia"}))
        .await;
    assert_eq!(town["country"]["slug"], "russia");

    let shelter = app
        .post(
            "/api/v1/shelters",
            &token,
            json!({"name": "Happy Paws", "address": "Baumana 1", "town": town["id"]}),
        )
        .await;
    assert_eq!(shelter["slug"], "happy-paws");

    let walker = app
        .post(
            "/api/v1/pets",
            &token,
            json!({
                "family": "dog",
                "name": "Walker",
                "birthday": "2020-05-01T00:00:00Z",
                "shelter": shelter["id"],
                "in_favorites": 1,
                "take_a_home": 100,
                "take_a_walk": 100,
                "visit_counter": 100
            }),
        )
        .await;
    assert_eq!(walker["rating"], 70);
    assert_eq!(walker["breed"], "no breed");

    let cuddly = app
        .post(
            "/api/v1/pets",
            &token,
            json!({
                "family": "cat",
                "name": "Cuddly",
                "gender": "female",
                "birthday": "2021-01-01T00:00:00Z",
                "shelter": shelter["id"],
                "in_favorites": 50
            }),
        )
        .await;
    assert!(cuddly["rating"].is_null());

    // Catalog order follows the favorites counter, not the rating
    let pets = app.server.get("/api/v1/pets").await.json::<Value>();
    let names: Vec<&str> = pets
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Walker", "Cuddly"]);

    let cats = app
        .server
        .get("/api/v1/pets")
        .add_query_param("family", "cat")
        .add_query_param("town", "kaz")
        .await
        .json::<Value>();
    assert_eq!(cats.as_array().unwrap().len(), 1);
    assert_eq!(cats[0]["name"], "Cuddly");

    let favorites = app
        .server
        .get("/api/v1/pets/favorite")
        .add_query_param("town", "kazan")
        .await;
    favorites.assert_status_ok();
    assert_eq!(favorites.json::<Value>().as_array().unwrap().len(), 2);

    app.server
        .get("/api/v1/pets/favorite")
        .add_query_param("town", "omsk")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pet_requires_birthday() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    app.server
        .post("/api/v1/pets")
        .authorization_bearer(&token)
        .json(&json!({"family": "cat", "name": "Murka"}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_slug_conflicts() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    app.post("/api/v1/services", &token, json!({"name": "Vet"})).await;

    app.server
        .post("/api/v1/services")
        .authorization_bearer(&token)
        .json(&json!({"name": "Vet"}))
        .await
        .assert_status(StatusCode::CONFLICT);

    app.server
        .post("/api/v1/services")
        .authorization_bearer(&token)
        .json(&json!({"name": "Food", "slug": "bad slug!"}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_transactions_by_town() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let town = app.post("/api/v1/towns", &token, json!({"name": "Kazan"})).await;
    let shelter = app
        .post("/api/v1/shelters", &token, json!({"name": "Paws", "town": town["id"]}))
        .await;
    let pet = app
        .post(
            "/api/v1/pets",
            &token,
            json!({"family": "cat", "name": "Murka", "birthday": "2022-03-01T00:00:00Z", "shelter": shelter["id"]}),
        )
        .await;

    let usd = app
        .post(
            "/api/v1/transactions",
            &token,
            json!({"pet": pet["id"], "donation": 7612.0, "currency": "usd"}),
        )
        .await;
    assert_eq!(usd["summary"], "Sum of donation: 100.0 USD");
    app.post(
        "/api/v1/transactions",
        &token,
        json!({"pet": pet["id"], "donation": 50.0}),
    )
    .await;
    app.post("/api/v1/transactions", &token, json!({"donation": 1.0})).await;

    let ledger = app
        .server
        .get("/api/v1/transactions/town/kazan")
        .await
        .json::<Value>();
    let amounts: Vec<f64> = ledger
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["donation"].as_f64().unwrap())
        .collect();
    assert_eq!(amounts, vec![50.0, 7612.0]);

    app.server
        .get("/api/v1/transactions/town/omsk")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .post("/api/v1/transactions")
        .authorization_bearer(&token)
        .json(&json!({"donation": -5.0}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_partial_update_clears_reference() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    app.post("/api/v1/countries", &token, json!({"name": "Russia"})).await;
    app.post("/api/v1/towns", &token, json!({"name": "Kazan", "country": "russia"}))
        .await;

    let response = app
        .server
        .patch("/api/v1/towns/kazan")
        .authorization_bearer(&token)
        .json(&json!({"country": null}))
        .await;
    response.assert_status_ok();
    assert!(response.json::<Value>()["country"].is_null());

    let untouched = app
        .server
        .patch("/api/v1/towns/kazan")
        .authorization_bearer(&token)
        .json(&json!({"name": "Kazan City"}))
        .await
        .json::<Value>();
    assert_eq!(untouched["slug"], "kazan");
}

#[tokio::test]
async fn test_country_search_and_delete() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    for name in ["Russia", "Belarus", "Kazakhstan"] {
        app.post("/api/v1/countries", &token, json!({"name": name})).await;
    }

    let found = app
        .server
        .get("/api/v1/countries")
        .add_query_param("search", "RUS")
        .await
        .json::<Value>();
    let names: Vec<&str> = found
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Belarus", "Russia"]);

    app.server
        .delete("/api/v1/countries/russia")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    app.server
        .get("/api/v1/countries/russia")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
