//! Data models

pub mod action;
pub mod row;
