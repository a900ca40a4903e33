pub mod application;
pub mod archive;
pub mod cleanup;
pub mod commands;
pub mod config;
pub mod package;
pub mod remote;
pub mod runtime;
