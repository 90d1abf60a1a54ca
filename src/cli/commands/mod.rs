pub mod chains;
pub mod clean;
pub mod config;
pub mod exec;
pub mod import;
pub mod init;
pub mod run;
pub mod status;
pub mod wallet;
