//! Domain models for the server.

pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use order::{
    NewOrderLine, NewShippingDetail, Order, OrderLine, OrderLineDetail, OrderWithDetails,
    PlaceOrder, ShippingDetail,
};
pub use product::{NewProduct, Product, ProductChanges};
pub use session::{CurrentUser, session_keys};
pub use user::User;
