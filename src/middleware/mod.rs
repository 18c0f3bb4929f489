mod core;
mod request_log;

pub use core::{Middleware, Outcome};
pub use request_log::RequestLogMiddleware;
