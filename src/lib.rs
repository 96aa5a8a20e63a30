pub mod adapters;
pub mod align;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod ident;
pub mod npy;
pub mod numeric;
pub mod output;
pub mod scan;
pub mod summary;
pub mod table;
