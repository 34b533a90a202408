//! A one-route HTTP server answering every request with the same response.
use std::{
    convert::Infallible,
    net::{SocketAddr, TcpListener},
    sync::{Arc, Mutex},
};

use hyper::{Body, Request, Response, StatusCode, server::conn::Http, service::service_fn};
use tokio::runtime::Runtime;

pub struct HttpStub {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
    runtime: Option<Runtime>,
}

impl HttpStub {
    pub fn serve(status: u16, body: &str) -> Self {
        // Bind to port 0 so the OS assigns an available port.
        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
        let addr = listener.local_addr().expect("no local address");
        listener
            .set_nonblocking(true)
            .expect("failed to set listener to non-blocking");

        let status = StatusCode::from_u16(status).expect("invalid status");
        let requests = Arc::new(Mutex::new(Vec::new()));

        // The stub owns its runtime so plain and async tests can both use it.
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .expect("failed to create tokio runtime for the stub");
        runtime.spawn(accept_loop(
            listener,
            status,
            body.to_string(),
            Arc::clone(&requests),
        ));

        Self {
            addr,
            requests,
            runtime: Some(runtime),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Request lines and headers received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("poisoned").clone()
    }
}

impl Drop for HttpStub {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    status: StatusCode,
    body: String,
    requests: Arc<Mutex<Vec<String>>>,
) {
    let listener =
        tokio::net::TcpListener::from_std(listener).expect("failed to convert listener to tokio");

    loop {
        let Ok((stream, _peer)) = listener.accept().await else {
            break;
        };

        let body = body.clone();
        let requests = Arc::clone(&requests);
        let svc = service_fn(move |req: Request<Body>| {
            requests.lock().expect("poisoned").push(head(&req));

            let response = Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.clone()))
                .expect("invalid response");
            async move { Ok::<_, Infallible>(response) }
        });

        tokio::spawn(async move {
            if let Err(err) = Http::new().serve_connection(stream, svc).await {
                eprintln!("stub connection error: {}", err);
            }
        });
    }
}

/// `GET /users?_limit=10 HTTP/1.1` followed by one `name: value` line per header.
fn head(req: &Request<Body>) -> String {
    let target = req
        .uri()
        .path_and_query()
        .map(|target| target.as_str())
        .unwrap_or("/");

    let mut head = format!("{} {} {:?}\r\n", req.method(), target, req.version());
    for (name, value) in req.headers() {
        head.push_str(&format!(
            "{}: {}\r\n",
            name,
            value.to_str().unwrap_or_default()
        ));
    }

    head
}
