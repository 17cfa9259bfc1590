use serde_json::json;

use crate::common::{ADMIN_PASSWORD, TestApp, routes};

mod login {
    use super::*;

    #[tokio::test]
    async fn correct_password_returns_a_token() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(routes::LOGIN, &json!({"password": ADMIN_PASSWORD}))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["token"].as_str().is_some_and(|t| !t.is_empty()));
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(routes::LOGIN, &json!({"password": "letmein"}))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn malformed_body_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app.post_json(routes::LOGIN, &json!({"pass": "x"})).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod token_checks {
    use super::*;

    #[tokio::test]
    async fn me_reports_the_admin_identity() {
        let app = TestApp::spawn().await;
        let token = app.login().await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["username"], "admin");
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::ME).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");

        let res = app.get(routes::ADMIN_ENTRIES).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not-a-jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_is_rejected() {
        let app = TestApp::spawn().await;
        let forged = server::utils::jwt::sign("some-other-secret").unwrap();

        let res = app.get_with_token(routes::ME, &forged).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}
