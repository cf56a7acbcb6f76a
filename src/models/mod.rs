pub mod conversation;
pub mod customer;
pub mod message;
pub mod user;
