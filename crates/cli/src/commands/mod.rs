pub mod build;
pub mod init;
pub mod serve;
pub mod site;
pub mod validate;
