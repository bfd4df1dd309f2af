pub mod args;
pub mod models;
pub mod response;
pub mod run;
