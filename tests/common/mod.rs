#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tokio::sync::oneshot;

/// One multipart part received by the stub.
#[derive(Debug, Clone)]
pub struct UploadedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// One HTTP request as seen by the stub.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub parts: Vec<UploadedPart>,
}

impl CapturedRequest {
    pub fn fields(&self, name: &str) -> Vec<&UploadedPart> {
        self.parts.iter().filter(|p| p.name == name).collect()
    }
}

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    body: String,
    seen: Arc<Mutex<Vec<CapturedRequest>>>,
}

/// An axum app on its own runtime thread that records every request and
/// answers each with the same status and body.
pub struct StubServer {
    pub url: String,
    seen: Arc<Mutex<Vec<CapturedRequest>>>,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl StubServer {
    pub fn reply(status: StatusCode, body: &str) -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        listener.set_nonblocking(true).expect("nonblocking listener");
        let url = format!("http://{}", listener.local_addr().unwrap());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            status,
            body: body.to_string(),
            seen: Arc::clone(&seen),
        };
        let app = Router::new().fallback(capture).with_state(state);
        let (shutdown, stopped) = oneshot::channel::<()>();

        let handle = thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("stub runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).expect("tokio listener");
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        stopped.await.ok();
                    })
                    .await
                    .expect("stub server");
            });
        });

        StubServer {
            url,
            seen,
            shutdown,
            handle,
        }
    }

    pub fn json(body: &str) -> Self {
        Self::reply(StatusCode::OK, body)
    }

    /// Stop the server and return what it received.
    pub fn finish(self) -> Vec<CapturedRequest> {
        let _ = self.shutdown.send(());
        self.handle.join().expect("stub server thread");
        let seen = self.seen.lock().unwrap();
        seen.clone()
    }
}

async fn capture(State(stub): State<StubState>, request: Request) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut parts = Vec::new();
    if content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
    {
        let mut multipart = Multipart::from_request(request, &stub)
            .await
            .expect("multipart body");
        while let Some(field) = multipart.next_field().await.expect("multipart field") {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let part_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.expect("field bytes");
            parts.push(UploadedPart {
                name,
                file_name,
                content_type: part_type,
                data,
            });
        }
    }

    stub.seen.lock().unwrap().push(CapturedRequest {
        method,
        path,
        content_type,
        parts,
    });

    (
        stub.status,
        [(CONTENT_TYPE, "application/json")],
        stub.body.clone(),
    )
        .into_response()
}
