//! Query functions over the raw SQLite connection.
//!
//! Each submodule owns one table plus its row types. Functions take a
//! `&Connection` (or `&mut` where a transaction is required) so they can
//! be composed inside larger units of work.

pub mod likes;
pub mod posts;
pub mod users;
pub mod views;
