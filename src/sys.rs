//! Host import function bindings.

#[cfg(target_arch = "wasm32")]
#[path = "sys/host.rs"]
mod bindings;

#[cfg(not(target_arch = "wasm32"))]
#[path = "sys/mock.rs"]
mod bindings;

pub use self::bindings::*;

/// Log levels of the host `wasi:logging/logging` interface.
pub mod level {
    pub const TRACE: i32 = 0;
    pub const DEBUG: i32 = 1;
    pub const INFO: i32 = 2;
    pub const WARN: i32 = 3;
    pub const ERROR: i32 = 4;
    pub const CRITICAL: i32 = 5;
}
