pub mod access;
pub mod config;
pub mod import;
pub mod init;
pub mod insights;
pub mod status;
