#![cfg(feature = "inmem-store")]

use actix_web::{test, web, App, HttpResponse};
use ascend::rate_limit::RateLimiterFacade;
use ascend::repo::inmem::InMemRepo;
use ascend::{config, AppState, SecurityHeaders};
use std::sync::Arc;

fn setup_env() {
    std::env::set_var("JWT_SECRET", "test-secret-must-be-32-bytes-long!!");
    let tmp = tempfile::tempdir().unwrap();
    std::env::set_var("ASCEND_DATA_DIR", tmp.path().to_str().unwrap());
}

fn app_state() -> actix_web::web::Data<AppState> {
    actix_web::web::Data::new(AppState {
        repo: Arc::new(InMemRepo::new()),
        limits: RateLimiterFacade::disabled(),
    })
}

#[actix_web::test]
#[serial_test::serial]
async fn security_headers_present_on_public_routes() {
    setup_env();
    std::env::remove_var("ENABLE_HSTS");
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_env())
            .app_data(app_state())
            .configure(config),
    )
    .await;
    let req = test::TestRequest::get().uri("/api/companies").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let headers = resp.headers();
    assert!(headers.get("content-security-policy").is_some());
    assert_eq!(headers.get("referrer-policy").unwrap(), "no-referrer");
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert!(headers.get("strict-transport-security").is_none()); // not enabled
}

#[actix_web::test]
#[serial_test::serial]
async fn hsts_enabled_via_builder() {
    setup_env();
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_env().with_hsts(true))
            .app_data(app_state())
            .configure(config),
    )
    .await;
    let req = test::TestRequest::get().uri("/api/companies").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    assert!(resp.headers().get("strict-transport-security").is_some(), "HSTS header missing");
}

#[actix_web::test]
#[serial_test::serial]
async fn hsts_enabled_via_env() {
    setup_env();
    std::env::set_var("ENABLE_HSTS", "1");
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_env())
            .app_data(app_state())
            .configure(config),
    )
    .await;
    let req = test::TestRequest::get().uri("/api/companies").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    assert!(resp.headers().get("strict-transport-security").is_some());
    std::env::remove_var("ENABLE_HSTS");
}

#[actix_web::test]
#[serial_test::serial]
async fn existing_csp_header_is_preserved() {
    setup_env();
    let app = test::init_service(
        App::new().wrap(SecurityHeaders::from_env()).route(
            "/custom",
            web::get().to(|| async {
                HttpResponse::Ok()
                    .insert_header((
                        actix_web::http::header::CONTENT_SECURITY_POLICY,
                        "custom-src 'none'",
                    ))
                    .finish()
            }),
        ),
    )
    .await;
    let req = test::TestRequest::get().uri("/custom").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let csp = resp.headers().get("content-security-policy").unwrap().to_str().unwrap();
    assert_eq!(csp, "custom-src 'none'");
}

#[actix_web::test]
#[serial_test::serial]
async fn error_bodies_use_the_error_envelope() {
    setup_env();
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_env())
            .app_data(app_state())
            .configure(config),
    )
    .await;
    // missing roadmap id: 404 with {"error": ...}
    let req = test::TestRequest::get().uri("/api/career/roadmaps/424242").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(body["error"], "not found");
}
