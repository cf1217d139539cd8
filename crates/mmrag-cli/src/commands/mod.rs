pub mod ask;
pub mod auth;
pub mod dispatch;
pub mod index;
pub mod shell;
