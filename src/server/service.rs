use std::io;
use std::sync::Arc;

use may_minihttp::{HttpService, Request, Response};
use serde_json::json;

use super::request::parse_request;
use super::response::write_json_error;
use crate::middleware::{Middleware, Outcome};

/// The frozen middleware pipeline, served as one `may_minihttp` service.
///
/// Stages were appended in mount order by the bootstrap and are immutable
/// once the service exists. Each request walks the chain; the first stage
/// that answers wins, and a fully unanswered request gets a JSON 404.
pub struct AppService {
    stages: Arc<Vec<Box<dyn Middleware>>>,
}

impl Clone for AppService {
    fn clone(&self) -> Self {
        Self {
            stages: Arc::clone(&self.stages),
        }
    }
}

impl AppService {
    pub fn new(stages: Vec<Box<dyn Middleware>>) -> Self {
        Self {
            stages: Arc::new(stages),
        }
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let mut ctx = parse_request(req);
        for stage in self.stages.iter() {
            match stage.handle(&mut ctx, res)? {
                Outcome::Done => return Ok(()),
                Outcome::Next => continue,
            }
        }
        write_json_error(
            res,
            404,
            json!({
                "error": "Not Found",
                "method": ctx.method.as_str(),
                "path": ctx.path,
            }),
        );
        Ok(())
    }
}
