//! QuickJS-backed client used in place of a browser.

mod client;
mod runtime;
mod session;

pub use client::{ClientOptions, ClientPage};
pub use runtime::QuickJsEngine;
pub use session::LocalSession;
