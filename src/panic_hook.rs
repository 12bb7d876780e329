//! Module implementing a panic hook that reports panics to the host log before
//! the guest traps.

use crate::{
    ffi::string::StrView,
    logger,
    sys::level,
};
use std::{any::Any, panic, panic::Location};

/// Sets the panic hook to report panics through the host logging import.
pub fn set_panic_hook() {
    panic::set_hook(Box::new(|info| {
        let message = describe(info.payload(), info.location());
        logger::write(level::CRITICAL, StrView::new("panic"), StrView::new(&message));
    }));
}

/// Formats a panic payload and its location.
fn describe(payload: &(dyn Any + Send), location: Option<&Location>) -> String {
    let message = if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "Box<dyn Any>"
    };

    match location {
        Some(location) => format!(
            "{} at {}:{}:{}",
            message,
            location.file(),
            location.line(),
            location.column(),
        ),
        None => message.to_owned(),
    }
}
