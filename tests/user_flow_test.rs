//! End-to-end flows against a real Postgres.
//!
//! Run with `TEST_DATABASE_URL=postgres://... cargo test -- --ignored`.

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, HttpServer, test, web};
use chrono::{Days, Utc};
use serde_json::{Value, json};

use dietplan::models::{diet_plan, user};
use dietplan::planner::GeminiClient;

use common::*;

fn jane() -> Value {
    json!({
        "name": "Jane Doe",
        "email": "Jane@Example.com",
        "password": "secret123",
        "age": 30,
        "gender": "Female",
        "weight": 65.5,
        "height": 168,
        "activity_level": "active",
        "diet_preference": "vegetarian",
        "health_goals": "Run a marathon"
    })
}

fn bearer(token: &str) -> (&'static str, String) {
    ("authorization", format!("Bearer {token}"))
}

fn login_body(email: &str, password: &str) -> Value {
    json!({ "email": email, "password": password })
}

// ============================================================================
// REGISTRATION AND LOGIN
// ============================================================================

#[actix_web::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn register_then_login_then_profile() {
    let db = setup_test_db().await;
    let svc = TestServices::new(db.pool().clone());
    let app = test_app!(svc);

    let req = test::TestRequest::post().uri("/api/register").set_json(jane()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["email"], "jane@example.com");
    assert_eq!(body["user"]["gender"], "female");
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["access_token"].as_str().is_some_and(|t| !t.is_empty()));

    let req = test::TestRequest::post()
        .uri("/api/login")
        .peer_addr(CLIENT_ADDR.parse().unwrap())
        .set_json(login_body("JANE@example.com", "secret123"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["name"], "Jane Doe");
    assert_eq!(body["activity_level"], "active");

    db.cleanup().await;
}

#[actix_web::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn duplicate_email_is_a_conflict() {
    let db = setup_test_db().await;
    let svc = TestServices::new(db.pool().clone());
    let app = test_app!(svc);

    let req = test::TestRequest::post().uri("/api/register").set_json(jane()).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let mut again = jane();
    again["email"] = json!("  jane@EXAMPLE.com ");
    let req = test::TestRequest::post().uri("/api/register").set_json(again).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "User with this email already exists");

    db.cleanup().await;
}

#[actix_web::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn wrong_passwords_lock_the_account() {
    let db = setup_test_db().await;
    let svc = TestServices::new(db.pool().clone());
    let app = test_app!(svc);

    let req = test::TestRequest::post().uri("/api/register").set_json(jane()).to_request();
    test::call_service(&app, req).await;

    for _ in 0..5 {
        let req = test::TestRequest::post()
            .uri("/api/login")
            .peer_addr(CLIENT_ADDR.parse().unwrap())
            .set_json(login_body("jane@example.com", "wrong-password"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid email or password");
    }

    // The correct password is refused while locked.
    let req = test::TestRequest::post()
        .uri("/api/login")
        .peer_addr(CLIENT_ADDR.parse().unwrap())
        .set_json(login_body("jane@example.com", "secret123"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::TOO_MANY_REQUESTS);

    svc.clock.advance(900);
    let req = test::TestRequest::post()
        .uri("/api/login")
        .peer_addr(CLIENT_ADDR.parse().unwrap())
        .set_json(login_body("jane@example.com", "secret123"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    db.cleanup().await;
}

#[actix_web::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn unknown_email_counts_as_a_failure() {
    let db = setup_test_db().await;
    let svc = TestServices::new(db.pool().clone());
    let app = test_app!(svc);

    let req = test::TestRequest::post()
        .uri("/api/login")
        .peer_addr(CLIENT_ADDR.parse().unwrap())
        .set_json(login_body("ghost@example.com", "whatever"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        svc.throttle.ledger().recent_failures("ghost@example.com", svc.throttle.now()),
        1
    );

    db.cleanup().await;
}

// ============================================================================
// PROFILE
// ============================================================================

#[actix_web::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn profile_update_applies_partial_changes() {
    let db = setup_test_db().await;
    let svc = TestServices::new(db.pool().clone());
    let app = test_app!(svc);

    let req = test::TestRequest::post().uri("/api/register").set_json(jane()).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri("/api/profile")
        .insert_header(bearer(&token))
        .set_json(json!({ "weight": 63, "password": "", "diet_preference": "Keto" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Profile updated successfully");
    assert_eq!(body["user"]["weight"], 63.0);
    assert_eq!(body["user"]["diet_preference"], "keto");
    assert_eq!(body["user"]["name"], "Jane Doe");

    // Blank password left the old one in place.
    let req = test::TestRequest::post()
        .uri("/api/login")
        .peer_addr(CLIENT_ADDR.parse().unwrap())
        .set_json(login_body("jane@example.com", "secret123"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    db.cleanup().await;
}

#[actix_web::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn profile_update_rejects_taken_email() {
    let db = setup_test_db().await;
    let svc = TestServices::new(db.pool().clone());
    let app = test_app!(svc);

    let mut other = jane();
    other["email"] = json!("other@example.com");
    let req = test::TestRequest::post().uri("/api/register").set_json(other).to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post().uri("/api/register").set_json(jane()).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri("/api/profile")
        .insert_header(bearer(&token))
        .set_json(json!({ "email": "OTHER@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Re-submitting one's own email is fine.
    let req = test::TestRequest::put()
        .uri("/api/profile")
        .insert_header(bearer(&token))
        .set_json(json!({ "email": "jane@example.com" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    db.cleanup().await;
}

// ============================================================================
// DIET PLANS
// ============================================================================

async fn fake_generate() -> HttpResponse {
    let plan = json!({
        "total_calories_per_day": 2100,
        "days": [{ "day": 1, "meals": [] }]
    });
    HttpResponse::Ok().json(json!({
        "candidates": [{
            "content": { "parts": [{ "text": format!("Here you go:\n```json\n{plan}\n```") }] }
        }]
    }))
}

#[actix_web::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn diet_plan_is_generated_stored_and_listed() {
    let db = setup_test_db().await;
    let svc = TestServices::new(db.pool().clone());

    let server = HttpServer::new(|| App::new().default_service(web::to(fake_generate)))
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
    let upstream = format!("http://{}", server.addrs()[0]);
    actix_web::rt::spawn(server.run());

    let planner = GeminiClient::new(Some("test-key".to_string()), "gemini-1.5-flash")
        .with_base_url(upstream);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(svc.pool.clone()))
            .app_data(web::Data::new(svc.tokens.clone()))
            .app_data(web::Data::new(svc.throttle.clone()))
            .app_data(web::Data::new(planner))
            .app_data(svc.monitor.clone())
            .app_data(web::Data::new(svc.config.clone()))
            .configure(dietplan::handlers::configure),
    )
    .await;

    let req = test::TestRequest::post().uri("/api/register").set_json(jane()).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/diet-plan")
        .insert_header(bearer(&token))
        .insert_header(("content-type", "application/json"))
        .set_payload("{}")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["total_calories"], 2100);
    assert_eq!(created["plan_name"], "1-Week Vegetarian Diet Plan");
    assert_eq!(created["plan_data"]["days"][0]["day"], 1);

    let today = Utc::now().date_naive();
    assert_eq!(created["start_date"], today.to_string());
    assert_eq!(created["end_date"], today.checked_add_days(Days::new(6)).unwrap().to_string());

    let req = test::TestRequest::get()
        .uri("/api/diet-plans")
        .insert_header(bearer(&token))
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let id = created["id"].as_i64().unwrap();
    let req = test::TestRequest::get()
        .uri(&format!("/api/diet-plan/{id}"))
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    db.cleanup().await;
}

#[actix_web::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn generation_failure_is_a_server_error() {
    let db = setup_test_db().await;
    let svc = TestServices::new(db.pool().clone());
    let app = test_app!(svc);

    let req = test::TestRequest::post().uri("/api/register").set_json(jane()).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    // No API key configured in the test services.
    let req = test::TestRequest::post()
        .uri("/api/diet-plan")
        .insert_header(bearer(&token))
        .insert_header(("content-type", "application/json"))
        .set_payload("{}")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Failed to generate diet plan");

    let plans = diet_plan::find_for_user(db.pool(), svc.tokens.verify(&token).unwrap()).await.unwrap();
    assert!(plans.is_empty());

    db.cleanup().await;
}

// ============================================================================
// MODEL QUERIES
// ============================================================================

#[actix_web::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn plans_are_scoped_to_their_owner() {
    let db = setup_test_db().await;
    let pool = db.pool();

    let hash = dietplan::auth::password::hash_password("secret123").unwrap();
    let owner = user::create(pool, &new_user("owner@example.com", &hash)).await.unwrap();
    let stranger = user::create(pool, &new_user("stranger@example.com", &hash)).await.unwrap();

    let today = Utc::now().date_naive();
    let mut ids = Vec::new();
    for calories in [1800, 2000] {
        let plan = diet_plan::create(
            pool,
            &diet_plan::NewDietPlan {
                user_id: owner.id,
                plan_name: "1-Week Balanced Diet Plan".to_string(),
                start_date: today,
                end_date: today,
                total_calories: calories,
                plan_data: json!({ "daily_calories": calories }),
            },
        )
        .await
        .unwrap();
        ids.push(plan.id);
    }

    let listed = diet_plan::find_for_user(pool, owner.id).await.unwrap();
    assert_eq!(listed.iter().map(|p| p.id).collect::<Vec<_>>(), vec![ids[1], ids[0]]);

    assert!(diet_plan::find_owned(pool, ids[0], owner.id).await.unwrap().is_some());
    assert!(diet_plan::find_owned(pool, ids[0], stranger.id).await.unwrap().is_none());
    assert!(diet_plan::find_for_user(pool, stranger.id).await.unwrap().is_empty());

    let err = user::create(pool, &new_user("owner@example.com", &hash)).await.unwrap_err();
    assert!(user::is_unique_violation(&err));

    db.cleanup().await;
}

#[actix_web::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn foreign_plan_is_not_found() {
    let db = setup_test_db().await;
    let svc = TestServices::new(db.pool().clone());
    let app = test_app!(svc);

    let hash = dietplan::auth::password::hash_password("secret123").unwrap();
    let owner = user::create(db.pool(), &new_user("owner@example.com", &hash)).await.unwrap();
    let today = Utc::now().date_naive();
    let plan = diet_plan::create(
        db.pool(),
        &diet_plan::NewDietPlan {
            user_id: owner.id,
            plan_name: "1-Week Balanced Diet Plan".to_string(),
            start_date: today,
            end_date: today,
            total_calories: 2000,
            plan_data: json!({}),
        },
    )
    .await
    .unwrap();

    let req = test::TestRequest::post().uri("/api/register").set_json(jane()).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/api/diet-plan/{}", plan.id))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Diet plan not found");

    db.cleanup().await;
}

fn new_user(email: &str, hash: &str) -> user::NewUser {
    user::NewUser {
        name: "Test User".to_string(),
        email: email.to_string(),
        password_hash: hash.to_string(),
        age: 40,
        gender: "other".to_string(),
        weight: 80.0,
        height: None,
        activity_level: "moderate".to_string(),
        diet_preference: "balanced".to_string(),
        health_goals: String::new(),
    }
}
