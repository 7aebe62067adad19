// Checkout domain models
pub mod cart;
pub mod payment;
pub mod product;

pub use cart::{CartLine, CartRequest, ValidatedCart, ValidatedLine};
pub use payment::{PaymentEvent, PaymentEventType, ReservationMetadata, ReservedLine};
pub use product::Product;
