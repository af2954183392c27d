// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (bearer token verified by identity_middleware)

pub mod public;    // Tier 1: No authentication required (/, /ping, /health)
pub mod protected; // Tier 2: Bearer token required (users, replacements, messages)
