mod common;

use axum_storefront_api::{
    dto::cart::AddToCartRequest,
    error::AppError,
    models::{CartItem, Permission},
    services::cart_service,
};
use uuid::Uuid;

use common::{GatewayMode, MockGateway, MockMailer, cart_row_count, create_item, create_user, setup_state};

// Adding the same item twice yields one row with quantity 2, never two rows.
#[tokio::test]
async fn repeated_add_increments_one_row() -> anyhow::Result<()> {
    let state = match setup_state(MockGateway::new(GatewayMode::Succeed), MockMailer::new()).await? {
        Some(state) => state,
        None => return Ok(()),
    };

    let seller = create_user(&state, &[Permission::User]).await?;
    let buyer = create_user(&state, &[Permission::User]).await?;
    let item = create_item(&state, seller.user_id(), "Repeat Item", 500).await?;

    let first = cart_service::add_to_cart(&state, &buyer, AddToCartRequest { item_id: item.id })
        .await?
        .data
        .unwrap();
    assert_eq!(first.quantity, 1);

    let second = cart_service::add_to_cart(&state, &buyer, AddToCartRequest { item_id: item.id })
        .await?
        .data
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.quantity, 2);

    assert_eq!(cart_row_count(&state, buyer.user_id()).await?, 1);
    Ok(())
}

#[tokio::test]
async fn adding_unknown_item_is_not_found() -> anyhow::Result<()> {
    let state = match setup_state(MockGateway::new(GatewayMode::Succeed), MockMailer::new()).await? {
        Some(state) => state,
        None => return Ok(()),
    };

    let buyer = create_user(&state, &[Permission::User]).await?;
    let err = cart_service::add_to_cart(
        &state,
        &buyer,
        AddToCartRequest {
            item_id: Uuid::new_v4(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

// Only the owner of a cart row may remove it.
#[tokio::test]
async fn removing_someone_elses_cart_item_is_forbidden() -> anyhow::Result<()> {
    let state = match setup_state(MockGateway::new(GatewayMode::Succeed), MockMailer::new()).await? {
        Some(state) => state,
        None => return Ok(()),
    };

    let seller = create_user(&state, &[Permission::User]).await?;
    let buyer = create_user(&state, &[Permission::User]).await?;
    let intruder = create_user(&state, &[Permission::User]).await?;
    let item = create_item(&state, seller.user_id(), "Guarded Item", 500).await?;

    let line: CartItem = cart_service::add_to_cart(&state, &buyer, AddToCartRequest { item_id: item.id })
        .await?
        .data
        .unwrap();

    let err = cart_service::remove_from_cart(&state, &intruder, line.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden { .. }));
    assert_eq!(cart_row_count(&state, buyer.user_id()).await?, 1);

    cart_service::remove_from_cart(&state, &buyer, line.id).await?;
    assert_eq!(cart_row_count(&state, buyer.user_id()).await?, 0);
    Ok(())
}

#[tokio::test]
async fn removing_missing_cart_item_is_not_found() -> anyhow::Result<()> {
    let state = match setup_state(MockGateway::new(GatewayMode::Succeed), MockMailer::new()).await? {
        Some(state) => state,
        None => return Ok(()),
    };

    let buyer = create_user(&state, &[Permission::User]).await?;
    let err = cart_service::remove_from_cart(&state, &buyer, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}
