use crate::server::request::RequestContext;
use may_minihttp::Response;
use std::io;

/// What a stage did with the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The stage wrote a response; the chain stops here.
    Done,
    /// The stage did not answer; the next stage runs.
    Next,
}

/// One stage of the request pipeline.
///
/// Stages are walked in mount order and the first one returning
/// [`Outcome::Done`] wins, so a stage mounted earlier can never be shadowed
/// by a later one. An `Err` aborts the request and surfaces through the
/// server as an I/O failure; stages that want a soft failure answer with an
/// error status instead.
pub trait Middleware: Send + Sync {
    fn handle(&self, ctx: &mut RequestContext, res: &mut Response) -> io::Result<Outcome>;
}
