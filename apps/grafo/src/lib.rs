//! Library surface of the Grafo binary: the clap CLI and the built-in
//! plugins, exposed so integration tests can drive them directly.

pub mod cli;
pub mod plugins;
