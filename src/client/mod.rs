//! Client-side state: the cart being assembled and the signed-in session.

pub mod cart;
pub mod session;

pub use cart::{Cart, CartItem};
pub use session::{KeyValueStore, MemoryStore, Session};
