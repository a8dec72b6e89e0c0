// Adapters layer: concrete implementations for external systems (storage, http, timers, signals).

pub mod clock;
pub mod http;
pub mod signal;
pub mod storage;
