//! Session-held models for the storefront.
//!
//! Everything persistent lives in the backend; these types only describe what
//! the storefront keeps in the visitor's session between requests.

pub mod basket;
pub mod flash;
pub mod session;

pub use basket::{BasketLine, ShopBasket};
pub use flash::{Flash, FlashLevel};
pub use session::{CurrentUser, keys as session_keys};
