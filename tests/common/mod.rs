#![allow(dead_code)]

use rust_decimal::Decimal;
use scholarpay::application::checkout::{Checkout, CheckoutEntry, CheckoutForm, CheckoutPage};
use scholarpay::domain::application::PaymentMethod;
use scholarpay::domain::money::Money;
use scholarpay::domain::payment::CardToken;
use scholarpay::domain::scholarship::{ScholarshipId, ScholarshipOffer};
use scholarpay::domain::session::{BearerToken, Identity};
use scholarpay::infrastructure::in_memory::{InMemoryApplicationStore, InMemoryScholarshipCatalog};
use scholarpay::infrastructure::scripted_gateway::ScriptedGateway;
use scholarpay::infrastructure::session::StaticSession;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const SCHOLARSHIP_ID: &str = "665f1c2e9b1e8a0012345678";

pub fn offer(application_fees: Decimal, service_charge: Decimal) -> ScholarshipOffer {
    ScholarshipOffer {
        id: ScholarshipId::new(SCHOLARSHIP_ID),
        scholarship_name: "Global Excellence Scholarship".to_string(),
        university_name: "University of Oslo".to_string(),
        university_image: "https://img.example/oslo.png".to_string(),
        university_country: "Norway".to_string(),
        degree: "Masters".to_string(),
        subject_category: "Engineering".to_string(),
        application_fees: Money::new(application_fees).unwrap(),
        service_charge: Money::new(service_charge).unwrap(),
    }
}

pub fn applicant() -> Identity {
    Identity::new(
        "ada@example.com",
        Some("Ada Lovelace"),
        Some("https://img.example/ada.png"),
    )
}

pub fn signed_in() -> StaticSession {
    StaticSession::signed_in(applicant(), BearerToken::new("id-token-1"))
}

pub fn form() -> CheckoutForm {
    CheckoutForm {
        cardholder_name: "Ada Lovelace".to_string(),
        terms_accepted: true,
        card: CardToken::new("tok_visa"),
        payment_method: PaymentMethod::Stripe,
    }
}

/// A checkout wired to in-memory adapters, with handles kept for assertions.
pub struct Harness {
    pub checkout: Checkout,
    pub gateway: ScriptedGateway,
    pub store: InMemoryApplicationStore,
}

pub async fn harness(offer: ScholarshipOffer, gateway: ScriptedGateway) -> Harness {
    harness_with_session(offer, gateway, signed_in()).await
}

pub async fn harness_with_session(
    offer: ScholarshipOffer,
    gateway: ScriptedGateway,
    session: StaticSession,
) -> Harness {
    let catalog = InMemoryScholarshipCatalog::new();
    catalog.insert(offer).await;
    let store = InMemoryApplicationStore::new();
    let checkout = Checkout::new(
        Box::new(session),
        Box::new(catalog),
        Box::new(gateway.clone()),
        Box::new(store.clone()),
    );
    Harness {
        checkout,
        gateway,
        store,
    }
}

pub async fn open(checkout: &Checkout) -> CheckoutPage<'_> {
    match checkout.open(&ScholarshipId::new(SCHOLARSHIP_ID)).await {
        CheckoutEntry::Ready(page) => page,
        CheckoutEntry::Redirect(redirect) => panic!("unexpected redirect to {redirect}"),
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

#[derive(Clone)]
struct Route {
    method: &'static str,
    path: String,
    status: u16,
    body: String,
}

/// Minimal HTTP/1.1 server answering canned responses per `METHOD path`.
///
/// Unknown routes get a 404. Every connection is closed after one response.
pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct StubBuilder {
    routes: Vec<Route>,
}

impl StubServer {
    pub fn builder() -> StubBuilder {
        StubBuilder { routes: Vec::new() }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

impl StubBuilder {
    pub fn route(mut self, method: &'static str, path: &str, status: u16, body: &str) -> Self {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            status,
            body: body.to_string(),
        });
        self
    }

    pub async fn start(self) -> StubServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let routes = Arc::new(self.routes);

        let recorded = requests.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let routes = routes.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    serve(stream, &routes, &recorded).await;
                });
            }
        });

        StubServer { base_url, requests }
    }
}

async fn serve(mut stream: TcpStream, routes: &[Route], recorded: &Mutex<Vec<RecordedRequest>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default();
    let path = target.split('?').next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let body_start = header_end + 4;
    while buf.len() < body_start + content_length {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let body_end = (body_start + content_length).min(buf.len());
    let body = String::from_utf8_lossy(&buf[body_start..body_end]).to_string();

    recorded.lock().unwrap().push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        headers,
        body,
    });

    let (status, payload) = routes
        .iter()
        .find(|r| r.method == method && r.path == path)
        .map(|r| (r.status, r.body.clone()))
        .unwrap_or((404, r#"{"message": "not found"}"#.to_string()));
    let response = format!(
        "HTTP/1.1 {status} STUB\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
