pub mod delivery;
pub mod notification;
pub mod position;
pub mod route;
pub mod user;
