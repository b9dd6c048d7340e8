use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Permission, User};

/// Wholesale replacement of the target user's permission set.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePermissionsRequest {
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct UserList {
    #[schema(value_type = Vec<User>)]
    pub items: Vec<User>,
}
