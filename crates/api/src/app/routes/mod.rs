pub mod checkout;
pub mod holds;
pub mod items;
pub mod orders;
