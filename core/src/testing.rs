//! Scripted transport shared by the unit tests.

use std::sync::{Arc, Mutex};

use crate::gateway::{Gateway, SharedToken};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, TransportError};

pub(crate) const BASE_URL: &str = "http://store.test";

type Route = (HttpMethod, String, Result<HttpResponse, TransportError>);

/// Answers requests from a table of `(method, path)` routes and records
/// every request it sees. Unrouted requests get a 404.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Install (or replace) the response for `method path`.
    pub(crate) fn respond(&self, method: HttpMethod, path: &str, status: u16, body: &str) {
        self.install(
            method,
            path,
            Ok(HttpResponse {
                status,
                headers: Vec::new(),
                body: body.to_string(),
            }),
        );
    }

    pub(crate) fn fail(&self, method: HttpMethod, path: &str, message: &str) {
        self.install(method, path, Err(TransportError::new(message)));
    }

    fn install(&self, method: HttpMethod, path: &str, outcome: Result<HttpResponse, TransportError>) {
        let mut routes = self.routes.lock().unwrap();
        routes.retain(|(m, p, _)| !(*m == method && p == path));
        routes.push((method, path.to_string(), outcome));
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub(crate) fn gateway(self: &Arc<Self>, token: SharedToken) -> Gateway {
        Gateway::new(BASE_URL, self.clone(), token)
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.seen.lock().unwrap().push(request.clone());
        let path = request.path.strip_prefix(BASE_URL).unwrap_or(&request.path);
        let routes = self.routes.lock().unwrap();
        routes
            .iter()
            .find(|(m, p, _)| *m == request.method && p == path)
            .map(|(_, _, outcome)| outcome.clone())
            .unwrap_or_else(|| {
                Ok(HttpResponse {
                    status: 404,
                    headers: Vec::new(),
                    body: String::new(),
                })
            })
    }
}

pub(crate) const USER_JSON: &str = r#"{"id":1,"email":"john@gmail.com","username":"johnd",
    "name":{"firstname":"john","lastname":"doe"},"phone":"1-570-236-7033",
    "address":{"city":"kilcoole","street":"new road","number":7682,"zipcode":"12926-3874"}}"#;

pub(crate) fn product_json(id: i64, title: &str, category: &str) -> String {
    format!(
        r#"{{"id":{id},"title":"{title}","price":10.5,"description":"desc",
        "category":"{category}","image":"https://img.test/{id}.jpg",
        "rating":{{"rate":4.1,"count":10}}}}"#
    )
}

pub(crate) fn products_json(items: &[(i64, &str, &str)]) -> String {
    let parts: Vec<String> = items
        .iter()
        .map(|(id, title, category)| product_json(*id, title, category))
        .collect();
    format!("[{}]", parts.join(","))
}
