pub mod cart;
pub mod flavor;
pub mod identity;
pub mod order;
