use std::future::IntoFuture;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use base64::prelude::*;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A request received by the KMS mock.
#[derive(Debug, Clone)]
pub struct KmsRequest {
    pub target: String,
    pub authorization: String,
    pub security_token: Option<String>,
    pub body: Value,
}

struct KmsMockContext {
    public_key: Vec<u8>,
    signature: Vec<u8>,
    deny: bool,
    requests: Mutex<Vec<KmsRequest>>,
}

pub struct KmsMockServer {
    /// Base URL, e.g. `http://127.0.0.1:41234`.
    pub endpoint: String,
    context: Arc<KmsMockContext>,
    handle: JoinHandle<Result<(), std::io::Error>>,
}

impl KmsMockServer {
    /// Starts a server that returns `public_key` from GetPublicKey and `signature` from Sign.
    pub async fn start(public_key: Vec<u8>, signature: Vec<u8>) -> Result<Self, std::io::Error> {
        Self::start_with(public_key, signature, false).await
    }

    /// Starts a server that rejects every call with `AccessDeniedException`.
    pub async fn start_denying() -> Result<Self, std::io::Error> {
        Self::start_with(vec![], vec![], true).await
    }

    async fn start_with(public_key: Vec<u8>, signature: Vec<u8>, deny: bool) -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).await?;
        let endpoint = format!("http://{}", listener.local_addr()?);
        let context = Arc::new(KmsMockContext {
            public_key,
            signature,
            deny,
            requests: Mutex::new(vec![]),
        });
        let router = Router::new().route("/", post(handle_kms)).with_state(context.clone());
        let handle = tokio::spawn(axum::serve(listener, router).into_future());
        tracing::debug!("kms-mock listening on {}", endpoint);
        Ok(Self {
            endpoint,
            context,
            handle,
        })
    }

    pub fn requests(&self) -> Vec<KmsRequest> {
        self.context.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of requests received for the given target, e.g. `TrentService.Sign`.
    pub fn count(&self, target: &str) -> usize {
        self.requests().iter().filter(|r| r.target == target).count()
    }
}

impl Drop for KmsMockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

const AMZ_JSON: &str = "application/x-amz-json-1.1";

fn kms_response(status: StatusCode, body: Value) -> Response {
    (status, [(CONTENT_TYPE, AMZ_JSON)], body.to_string()).into_response()
}

fn kms_error(status: StatusCode, error_type: &str, message: &str) -> Response {
    kms_response(status, json!({ "__type": error_type, "message": message }))
}

async fn handle_kms(State(context): State<Arc<KmsMockContext>>, headers: HeaderMap, body: Bytes) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    let target = header("x-amz-target");
    let authorization = header("authorization");
    let body: Value = match serde_json::from_slice(&body) {
        Ok(body) => body,
        Err(e) => return kms_error(StatusCode::BAD_REQUEST, "SerializationException", &e.to_string()),
    };
    if let Ok(mut requests) = context.requests.lock() {
        requests.push(KmsRequest {
            target: target.clone(),
            authorization: authorization.clone(),
            security_token: headers
                .get("x-amz-security-token")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body: body.clone(),
        });
    }

    if !authorization.starts_with("AWS4-HMAC-SHA256 Credential=") || header("x-amz-date").is_empty() {
        return kms_error(
            StatusCode::BAD_REQUEST,
            "IncompleteSignatureException",
            "Authorization header requires a SigV4 signature",
        );
    }
    if context.deny {
        return kms_error(
            StatusCode::BAD_REQUEST,
            "AccessDeniedException",
            "User is not authorized to perform: kms:Sign",
        );
    }
    let key_id = body["KeyId"].as_str().unwrap_or_default();
    match target.as_str() {
        "TrentService.GetPublicKey" => kms_response(
            StatusCode::OK,
            json!({
                "KeyId": key_id,
                "PublicKey": BASE64_STANDARD.encode(&context.public_key),
                "KeySpec": "RSA_2048",
                "KeyUsage": "SIGN_VERIFY",
                "SigningAlgorithms": ["RSASSA_PKCS1_V1_5_SHA_256", "RSASSA_PSS_SHA_256"],
            }),
        ),
        "TrentService.Sign" => {
            if body["MessageType"] != "DIGEST" {
                return kms_error(StatusCode::BAD_REQUEST, "ValidationException", "MessageType must be DIGEST");
            }
            kms_response(
                StatusCode::OK,
                json!({
                    "KeyId": key_id,
                    "Signature": BASE64_STANDARD.encode(&context.signature),
                    "SigningAlgorithm": body["SigningAlgorithm"],
                }),
            )
        }
        _ => kms_error(StatusCode::BAD_REQUEST, "UnknownOperationException", &target),
    }
}
