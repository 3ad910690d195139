mod credential;
mod implementation;
mod interface;

pub use credential::*;
pub use implementation::*;
pub use interface::*;
