use super::engine::Engine;
use super::request::parse_request;
use super::response::write_response;
use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::sync::Arc;

/// `may_minihttp` service running every request through an [`Engine`].
///
/// Cloned once per connection; all clones share the engine.
#[derive(Clone)]
pub struct AppService {
    pub engine: Arc<Engine>,
}

impl AppService {
    #[must_use]
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let request = parse_request(req);
        let response = self.engine.handle(&request);
        write_response(res, response);
        Ok(())
    }
}
