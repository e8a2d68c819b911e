//! Data models

pub mod book;
pub mod borrowing;
pub mod user;
