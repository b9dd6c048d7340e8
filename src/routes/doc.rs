use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{CartLine, CartList},
        items::ItemList,
        orders::{OrderList, OrderWithItems},
        users::UserList,
    },
    models::{CartItem, Item, Order, OrderItem, Permission, User},
    response::{ApiResponse, Meta},
    routes::{auth, cart, health, items, orders, params, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::signup,
        auth::signin,
        auth::signout,
        auth::request_reset,
        auth::reset_password,
        users::me,
        users::list_users,
        users::update_permissions,
        items::list_items,
        items::create_item,
        items::get_item,
        items::delete_item,
        cart::cart_list,
        cart::add_to_cart,
        cart::remove_from_cart,
        orders::list_orders,
        orders::checkout,
        orders::get_order
    ),
    components(
        schemas(
            User,
            Permission,
            Item,
            CartItem,
            Order,
            OrderItem,
            CartLine,
            CartList,
            ItemList,
            OrderList,
            OrderWithItems,
            UserList,
            params::Pagination,
            Meta,
            ApiResponse<User>,
            ApiResponse<Item>,
            ApiResponse<ItemList>,
            ApiResponse<CartList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Credential lifecycle endpoints"),
        (name = "Users", description = "Identity and permission endpoints"),
        (name = "Items", description = "Item endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Checkout and order endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
