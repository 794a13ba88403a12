pub mod command;
pub mod upload;
