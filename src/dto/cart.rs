use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Item;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub item_id: Uuid,
}

/// One cart row joined with the live item it points at.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub quantity: i32,
    pub item: Item,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CartList {
    #[schema(value_type = Vec<CartLine>)]
    pub items: Vec<CartLine>,
}
