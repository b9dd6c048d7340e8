use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::postgres::{PgHasArrayType, PgTypeInfo};
use utoipa::ToSchema;
use uuid::Uuid;

/// Capability token held in a set on a user. `USER` is granted at signup and
/// never removed by this layer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[sqlx(type_name = "permission", rename_all = "UPPERCASE", no_pg_array)]
#[serde(rename_all = "UPPERCASE")]
pub enum Permission {
    User,
    Admin,
    ItemDelete,
    PermissionUpdate,
}

impl PgHasArrayType for Permission {
    fn array_type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("_permission")
    }
}

#[derive(Debug, Clone, Serialize, ToSchema, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub permissions: Vec<Permission>,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Item {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    /// Price in minor currency units.
    pub price: i64,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct CartItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Gateway-settled total in minor currency units.
    pub total: i64,
    /// External charge reference id, the reconciliation key.
    pub charge: String,
    pub created_at: DateTime<Utc>,
}

/// Snapshot of an item at purchase time. Deliberately carries no reference to
/// the live item so later edits or deletes leave order history intact.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub price: i64,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}
