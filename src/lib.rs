// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod clock;
pub mod export;
pub mod recorder;
pub mod runtime;
pub mod session;
pub mod tacho;

pub use recorder::Entry;
pub use tacho::Tachometer;
