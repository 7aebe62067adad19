// Checkout core
pub mod cart_validator;
pub mod checkout;
pub mod reservation;
pub mod settlement;

pub use cart_validator::{CartValidator, UnknownProductPolicy};
pub use checkout::{CallbackUrls, CheckoutRedirect, CheckoutService};
pub use settlement::{Ack, SettlementService};
