//! Response envelope shared by every endpoint.
//!
//! Storefront clients parse one shape, `{ message, data, meta }`, whether
//! the payload is a user, an item page or nothing at all. `meta` carries
//! pagination for list endpoints and stays empty elsewhere.

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    /// Pagination block for list endpoints. `total` is the overall row
    /// count, not the size of this page.
    pub fn paginated(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }

    /// Envelope with no payload, for signout, reset requests and other
    /// operations where only the acknowledgement matters.
    pub fn acknowledge(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
            meta: Some(Meta::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acknowledgement_carries_null_data() {
        let resp: ApiResponse<serde_json::Value> = ApiResponse::acknowledge("Goodbye!");
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["message"], "Goodbye!");
        assert!(json["data"].is_null());
        assert!(json["meta"]["page"].is_null());
    }

    #[test]
    fn paginated_meta_serializes_all_three_fields() {
        let meta = Meta::paginated(2, 20, 57);
        let json = serde_json::to_value(&meta).unwrap();

        assert_eq!(json["page"], 2);
        assert_eq!(json["per_page"], 20);
        assert_eq!(json["total"], 57);
    }
}
