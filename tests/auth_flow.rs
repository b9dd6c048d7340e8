mod common;

use axum_storefront_api::{
    dto::{
        auth::{RequestResetRequest, ResetPasswordRequest, SigninRequest, SignupRequest},
        users::UpdatePermissionsRequest,
    },
    error::AppError,
    models::Permission,
    services::{auth_service, user_service},
};
use uuid::Uuid;

use common::{GatewayMode, MockGateway, MockMailer, create_user, setup_state};

#[tokio::test]
async fn signup_normalizes_email_and_grants_user_role() -> anyhow::Result<()> {
    let state = match setup_state(MockGateway::new(GatewayMode::Succeed), MockMailer::new()).await? {
        Some(state) => state,
        None => return Ok(()),
    };

    let local = Uuid::new_v4().simple().to_string();
    let (user, token) = auth_service::signup(
        &state,
        SignupRequest {
            email: format!("MiXeD-{local}@Example.COM"),
            name: "Casey".to_string(),
            password: "secret123".to_string(),
        },
    )
    .await?;

    assert_eq!(user.email, format!("mixed-{local}@example.com"));
    assert_eq!(user.permissions, vec![Permission::User]);
    assert!(!token.is_empty());

    // Signing in with a differently-cased email finds the same account.
    let (again, _) = auth_service::signin(
        &state,
        SigninRequest {
            email: format!("MIXED-{local}@EXAMPLE.com"),
            password: "secret123".to_string(),
        },
    )
    .await?;
    assert_eq!(again.id, user.id);
    Ok(())
}

#[tokio::test]
async fn signin_distinguishes_unknown_user_from_bad_password() -> anyhow::Result<()> {
    let state = match setup_state(MockGateway::new(GatewayMode::Succeed), MockMailer::new()).await? {
        Some(state) => state,
        None => return Ok(()),
    };

    let user = create_user(&state, &[Permission::User]).await?;

    let err = auth_service::signin(
        &state,
        SigninRequest {
            email: format!("missing-{}@example.com", Uuid::new_v4().simple()),
            password: "secret123".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = auth_service::signin(
        &state,
        SigninRequest {
            email: user.user.email.clone(),
            password: "wrong-password".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidCredential));
    Ok(())
}

// Full reset flow: the mailed token works exactly once and with strict expiry.
#[tokio::test]
async fn reset_token_is_single_use() -> anyhow::Result<()> {
    let mailer = MockMailer::new();
    let state = match setup_state(MockGateway::new(GatewayMode::Succeed), mailer.clone()).await? {
        Some(state) => state,
        None => return Ok(()),
    };

    let user = create_user(&state, &[Permission::User]).await?;

    auth_service::request_reset(
        &state,
        RequestResetRequest {
            email: user.user.email.clone(),
        },
    )
    .await?;

    // The mail carries a link embedding the stored token.
    let (token,): (String,) =
        sqlx::query_as("SELECT reset_token FROM users WHERE id = $1")
            .bind(user.user_id())
            .fetch_one(&state.pool)
            .await?;
    {
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, user.user.email);
        assert!(sent[0].2.contains(&token));
    }

    let err = auth_service::reset_password(
        &state,
        ResetPasswordRequest {
            reset_token: token.clone(),
            password: "new-password".to_string(),
            confirm_password: "different".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::PasswordMismatch));

    let (reset_user, _) = auth_service::reset_password(
        &state,
        ResetPasswordRequest {
            reset_token: token.clone(),
            password: "new-password".to_string(),
            confirm_password: "new-password".to_string(),
        },
    )
    .await?;
    assert_eq!(reset_user.id, user.user_id());

    // Old password gone, new one works.
    let err = auth_service::signin(
        &state,
        SigninRequest {
            email: user.user.email.clone(),
            password: "secret123".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidCredential));
    auth_service::signin(
        &state,
        SigninRequest {
            email: user.user.email.clone(),
            password: "new-password".to_string(),
        },
    )
    .await?;

    // Second use of the same token fails.
    let err = auth_service::reset_password(
        &state,
        ResetPasswordRequest {
            reset_token: token,
            password: "another-password".to_string(),
            confirm_password: "another-password".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidResetToken));
    Ok(())
}

#[tokio::test]
async fn expired_reset_token_is_rejected() -> anyhow::Result<()> {
    let state = match setup_state(MockGateway::new(GatewayMode::Succeed), MockMailer::new()).await? {
        Some(state) => state,
        None => return Ok(()),
    };

    let user = create_user(&state, &[Permission::User]).await?;
    let token = auth_service::generate_reset_token();

    // Backdate the expiry: a token one minute past expiry must not work.
    sqlx::query(
        "UPDATE users SET reset_token = $1, reset_token_expiry = now() - interval '1 minute' WHERE id = $2",
    )
    .bind(token.as_str())
    .bind(user.user_id())
    .execute(&state.pool)
    .await?;

    let err = auth_service::reset_password(
        &state,
        ResetPasswordRequest {
            reset_token: token,
            password: "new-password".to_string(),
            confirm_password: "new-password".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidResetToken));
    Ok(())
}

#[tokio::test]
async fn permission_update_requires_privilege_and_overwrites() -> anyhow::Result<()> {
    let state = match setup_state(MockGateway::new(GatewayMode::Succeed), MockMailer::new()).await? {
        Some(state) => state,
        None => return Ok(()),
    };

    let admin = create_user(&state, &[Permission::User, Permission::Admin]).await?;
    let plain = create_user(&state, &[Permission::User]).await?;
    let target = create_user(&state, &[Permission::User]).await?;

    let err = user_service::update_permissions(
        &state,
        &plain,
        target.user_id(),
        UpdatePermissionsRequest {
            permissions: vec![Permission::User, Permission::Admin],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden { .. }));

    let updated = user_service::update_permissions(
        &state,
        &admin,
        target.user_id(),
        UpdatePermissionsRequest {
            permissions: vec![Permission::User, Permission::ItemDelete],
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(
        updated.permissions,
        vec![Permission::User, Permission::ItemDelete]
    );
    Ok(())
}
