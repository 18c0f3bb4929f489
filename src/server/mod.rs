pub mod bootstrap;
pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use bootstrap::{create_server, PipelineBuilder, Server, ServerOptions, StageBuilder};
pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_request, RequestContext};
pub use service::AppService;
