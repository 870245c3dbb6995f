//! Database Models

pub mod cart;
pub mod catalog;
pub mod order;
pub mod user;

pub use cart::CartItemDetail;
pub use catalog::{CatalogProduct, CatalogVariant, ProductWithVariants};
pub use order::{
    NewOrderItem, Order, OrderDetail, OrderItemDetail, OrderStatus, PaymentStatus,
    ShippingRecipient,
};
pub use user::User;
