//! Router behaviour that does not need a database
//!
//! Run with: cargo test -p reciclaje-api --test router_tests

mod common;

use axum::http::StatusCode;
use common::*;
use reciclaje_shared::models::role::RoleKind;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

#[tokio::test]
async fn test_protected_page_redirects_to_login() {
    let response = offline_router().oneshot(get_request("/perfil", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response).as_deref(), Some("/login?redirect=/perfil"));
}

#[tokio::test]
async fn test_protected_sub_path_redirects_with_full_path() {
    let response = offline_router()
        .oneshot(get_request("/mensajes/123", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response).as_deref(), Some("/login?redirect=/mensajes/123"));
}

#[tokio::test]
async fn test_login_redirect_does_not_leak_extra_parameters() {
    let response = offline_router()
        .oneshot(get_request("/mensajes/a&next=https://evil.example", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&response).as_deref(),
        Some("/login?redirect=/mensajes/a%26next%3Dhttps%3A//evil.example")
    );
}

#[tokio::test]
async fn test_similar_prefix_is_not_protected() {
    let response = offline_router().oneshot(get_request("/perfiles", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(location(&response).is_none());
}

#[tokio::test]
async fn test_static_asset_under_protected_prefix_passes() {
    let response = offline_router()
        .oneshot(get_request("/perfil/avatar.png", None))
        .await
        .unwrap();

    assert_ne!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn test_invalid_session_cookie_is_redirected() {
    let response = offline_router()
        .oneshot(get_request("/dashboard", Some("not-a-jwt")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn test_api_without_session_is_unauthorized() {
    let response = offline_router().oneshot(get_request("/v1/users/me", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_security_headers_present() {
    let response = offline_router().oneshot(get_request("/v1/users/me", None)).await.unwrap();

    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
}

#[tokio::test]
async fn test_update_password_requires_fields() {
    let app = offline_router();

    for body in [
        json!({}),
        json!({ "password": "reciclo2024" }),
        json!({ "userId": Uuid::new_v4() }),
        json!({ "userId": "  ", "password": "reciclo2024" }),
    ] {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/update-password", &body.to_string(), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
    }
}

#[tokio::test]
async fn test_update_password_rejects_malformed_json() {
    let response = offline_router()
        .oneshot(json_request("POST", "/api/update-password", "{not json", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_password_rejects_malformed_user_id() {
    let body = json!({ "userId": "abc", "password": "reciclo2024" }).to_string();
    let response = offline_router()
        .oneshot(json_request("POST", "/api/update-password", &body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_password_needs_session() {
    let body = json!({ "userId": Uuid::new_v4(), "password": "reciclo2024" }).to_string();
    let response = offline_router()
        .oneshot(json_request("POST", "/api/update-password", &body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_password_for_other_user_is_forbidden() {
    let token = access_token(Uuid::new_v4(), RoleKind::PersonaNatural);
    let body = json!({ "userId": Uuid::new_v4(), "password": "reciclo2024" }).to_string();

    let response = offline_router()
        .oneshot(json_request("POST", "/api/update-password", &body, Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_update_password_rejects_weak_password() {
    let user_id = Uuid::new_v4();
    let token = access_token(user_id, RoleKind::Reciclador);
    let body = json!({ "userId": user_id, "password": "abc" }).to_string();

    let response = offline_router()
        .oneshot(json_request("POST", "/api/update-password", &body, Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["details"][0]["field"], "password");
}

#[tokio::test]
async fn test_contact_form_without_session_redirects_to_login() {
    let response = offline_router()
        .oneshot(form_request("/contactar", "recipient_id=x", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response).as_deref(), Some("/login?redirect=/contactar"));
}

#[tokio::test]
async fn test_contact_form_with_bad_recipient_redirects_with_error() {
    let token = access_token(Uuid::new_v4(), RoleKind::PersonaNatural);

    let response = offline_router()
        .oneshot(form_request("/contactar", "recipient_id=not-a-uuid", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response).as_deref(),
        Some("/mensajes?error=Usuario%20no%20encontrado")
    );
}

#[tokio::test]
async fn test_contact_form_to_self_redirects_with_error() {
    let user_id = Uuid::new_v4();
    let token = access_token(user_id, RoleKind::PersonaNatural);

    let response = offline_router()
        .oneshot(form_request("/contactar", &format!("recipient_id={}", user_id), Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response).as_deref(),
        Some("/mensajes?error=No%20puedes%20contactarte%20a%20ti%20mismo")
    );
}

#[tokio::test]
async fn test_blank_message_form_redirects_back_with_error() {
    let token = access_token(Uuid::new_v4(), RoleKind::Empresa);
    let conversation_id = Uuid::new_v4();
    let uri = format!("/mensajes/{}", conversation_id);

    let response = offline_router()
        .oneshot(form_request(&uri, "body=+++", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let target = location(&response).unwrap();
    assert!(target.starts_with(&format!("{}?error=", uri)), "location: {}", target);
}

#[tokio::test]
async fn test_rating_score_out_of_range() {
    let token = access_token(Uuid::new_v4(), RoleKind::Reciclador);
    let uri = format!("/v1/listings/{}/ratings", Uuid::new_v4());

    let response = offline_router()
        .oneshot(json_request("POST", &uri, &json!({ "score": 9 }).to_string(), Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let token = access_token(Uuid::new_v4(), RoleKind::PersonaNatural);

    let response = offline_router()
        .oneshot(json_request("POST", "/v1/auth/logout", "", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let cookie = response
        .headers()
        .get(axum::http::header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(cookie.starts_with("session="), "set-cookie: {}", cookie);
}
