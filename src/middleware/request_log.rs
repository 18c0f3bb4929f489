use std::io;

use may_minihttp::Response;
use tracing::{debug, info_span};

use super::{Middleware, Outcome};
use crate::server::request::RequestContext;

/// Guarantees every request carries a logger context before any handler runs.
///
/// Mounted unconditionally, ahead of all caller stages. If an earlier stage
/// already attached a span it is left alone; downstream stages enter
/// `ctx.span` for their own logging.
pub struct RequestLogMiddleware;

impl Middleware for RequestLogMiddleware {
    fn handle(&self, ctx: &mut RequestContext, _res: &mut Response) -> io::Result<Outcome> {
        if ctx.span.is_none() {
            let span = info_span!(
                "request",
                method = %ctx.method,
                path = %ctx.path,
            );
            span.in_scope(|| debug!("request log attached"));
            ctx.span = Some(span);
        }
        Ok(Outcome::Next)
    }
}
