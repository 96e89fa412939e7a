pub mod backend;
pub mod basis;
pub mod codec;
pub mod config;
pub mod error;
pub mod executor;
pub mod hypergraph;
pub mod optimizer;
pub mod persistence;
pub mod polynomial;
// cmd and reports are binary modules (see main.rs).
