//! Pipeline services

pub mod kvstore;
pub mod limits;
pub mod provisioner;
pub mod script_log;
pub mod session;
pub mod uploader;
