// handlers/mod.rs - Handlers grouped by security tier
//
// Public (no auth) -> Protected (JWT auth, mounted under /api)

pub mod protected;
pub mod public;
