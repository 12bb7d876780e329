//! Mock host import function bindings.
//!
//! Calls are recorded per thread so that tests can inspect them.

pub mod logging {
    use crate::ffi::string::StrView;
    use std::cell::RefCell;

    thread_local! {
        static RECORDS: RefCell<Vec<(i32, String, String)>> = RefCell::new(Vec::new());
    }

    pub unsafe fn log(
        level: i32,
        context_ptr: *const u8,
        context_len: usize,
        message_ptr: *const u8,
        message_len: usize,
    ) {
        let context = StrView::from_raw_parts(context_ptr, context_len);
        let message = StrView::from_raw_parts(message_ptr, message_len);
        RECORDS.with(|records| {
            records.borrow_mut().push((
                level,
                context.to_string_lossy().into_owned(),
                message.to_string_lossy().into_owned(),
            ))
        });
    }

    /// Returns and clears the log calls made on the current thread.
    #[cfg(test)]
    pub fn take_records() -> Vec<(i32, String, String)> {
        RECORDS.with(|records| records.replace(Vec::new()))
    }
}
