// Composition root shared by both binaries.
//
// - `config` reads the environment.
// - `http` and `state` wire the product use cases into the axum router.

pub mod config;
pub mod http;
pub mod state;
