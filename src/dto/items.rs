use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Item;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateItemRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub image: Option<String>,
    pub price: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ItemList {
    #[schema(value_type = Vec<Item>)]
    pub items: Vec<Item>,
}
