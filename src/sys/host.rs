//! Component host import function bindings.

pub mod logging {
    #[link(wasm_import_module = "wasi:logging/logging")]
    extern "C" {
        #[link_name = "log"]
        pub fn log(
            level: i32,
            context_ptr: *const u8,
            context_len: usize,
            message_ptr: *const u8,
            message_len: usize,
        );
    }
}
