// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Liveness checks and the service index. Nothing here touches caller identity.

pub mod health;
pub mod ping;
pub mod root;

pub use health::health;
pub use ping::ping;
pub use root::root;
