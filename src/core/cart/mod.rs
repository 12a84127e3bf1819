mod codec;
mod store;

pub use codec::{CART_STORAGE_KEY, decode, encode};
pub use store::{CartLine, CartLines, CartStore};
