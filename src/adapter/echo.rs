//! Built-in application that answers with the request's environment.
//!
//! Used as the default application behind the proxy and as a smoke test
//! for the adapter.

use std::io::Read;

use crate::adapter::environment::Environment;
use crate::adapter::rack::Application;
use crate::adapter::response::Triple;
use crate::error::BoxError;

/// Renders the environment (plus the request body) as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoEnvironment;

impl Application for EchoEnvironment {
    fn call(&self, env: &mut Environment) -> Result<Triple, BoxError> {
        let mut body = Vec::new();
        env.input.read_to_end(&mut body)?;

        let mut json = serde_json::to_value(&*env)?;
        if let Some(map) = json.as_object_mut() {
            map.insert(
                "rack.input".to_string(),
                String::from_utf8_lossy(&body).into_owned().into(),
            );
        }

        Ok(Triple::new(
            200,
            vec![("content-type".to_string(), "application/json".to_string())],
            serde_json::to_vec_pretty(&json)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::rack::Adapter;
    use crate::http::handler::Handler;
    use axum::body::Body;
    use axum::http::Request;

    #[tokio::test(flavor = "multi_thread")]
    async fn echoes_environment_and_body() {
        let adapter = Adapter::new(EchoEnvironment);
        let req = Request::builder()
            .method("POST")
            .uri("/echo?x=1")
            .header("host", "app.local:9292")
            .header("content-type", "text/plain")
            .body(Body::from("ping"))
            .unwrap();

        let res = adapter.call(req).await;
        assert_eq!(res.headers()["content-type"], "application/json");
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["REQUEST_METHOD"], "POST");
        assert_eq!(json["QUERY_STRING"], "x=1");
        assert_eq!(json["SERVER_NAME"], "app.local");
        assert_eq!(json["CONTENT_TYPE"], "text/plain");
        assert_eq!(json["HTTP_HOST"], "app.local:9292");
        assert_eq!(json["rack.input"], "ping");
    }
}
