use actix_web::{test, App, web, HttpResponse};
use somba_forum::config::AppConfig;
use somba_forum::{config, AppState, SecurityHeaders};

#[actix_web::test]
#[serial_test::serial]
async fn test_security_headers_present() {
    std::env::remove_var("ENABLE_HSTS");
    let cfg = AppConfig::from_env().unwrap();
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_config(&cfg))
            .app_data(web::Data::new(AppState::default()))
            .configure(config)
    ).await;
    let req = test::TestRequest::get().uri("/api/v1/pages/home").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let headers = resp.headers();
    assert!(headers.get("content-security-policy").is_some());
    assert_eq!(headers.get("referrer-policy").unwrap(), "no-referrer");
    assert_eq!(headers.get("cache-control").unwrap(), "no-store");
    assert!(headers.get("strict-transport-security").is_none()); // not enabled
}

#[actix_web::test]
#[serial_test::serial]
async fn test_env_var_enables_hsts() {
    std::env::set_var("ENABLE_HSTS", "1");
    let cfg = AppConfig::from_env().unwrap();
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_config(&cfg))
            .app_data(web::Data::new(AppState::default()))
            .configure(config)
    ).await;
    let req = test::TestRequest::get().uri("/api/v1/pages/agent").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    assert!(resp.headers().get("strict-transport-security").is_some(), "HSTS header missing");
    std::env::remove_var("ENABLE_HSTS");
}

#[actix_web::test]
#[serial_test::serial]
async fn test_builder_can_disable_hsts_even_when_env_set() {
    std::env::set_var("ENABLE_HSTS", "true");
    let cfg = AppConfig::from_env().unwrap();
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_config(&cfg).with_hsts(false))
            .app_data(web::Data::new(AppState::default()))
            .configure(config)
    ).await;
    let req = test::TestRequest::get().uri("/api/v1/pages/home").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    assert!(resp.headers().get("strict-transport-security").is_none());
    std::env::remove_var("ENABLE_HSTS");
}

#[actix_web::test]
async fn test_existing_headers_preserved() {
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::default())
            .route("/custom", web::get().to(|| async {
                HttpResponse::Ok()
                    .insert_header((actix_web::http::header::CONTENT_SECURITY_POLICY, "custom-src 'none'"))
                    .insert_header((actix_web::http::header::CACHE_CONTROL, "max-age=60"))
                    .finish()
            }))
    ).await;
    let req = test::TestRequest::get().uri("/custom").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let csp = resp.headers().get("content-security-policy").unwrap().to_str().unwrap();
    assert_eq!(csp, "custom-src 'none'");
    assert_eq!(resp.headers().get("cache-control").unwrap(), "max-age=60");
}
