//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every resource
//! façade over real HTTP through the default `ureq` transport. Validates that
//! request building, response decoding and error classification agree with
//! what an actual server sends.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener};
use std::time::{Duration, Instant};

use firmapi_core::{ClientConfig, ErrorKind, FirmApiClient, HttpMethod, Page};

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

/// One-shot raw HTTP server: reads the request head, then hands the stream
/// to `respond`.
fn serve_once<F>(respond: F) -> SocketAddr
where
    F: FnOnce(std::net::TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut line = String::new();
        while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
            line.clear();
        }
        respond(stream);
    });
    addr
}

fn client(addr: SocketAddr, key: &str) -> FirmApiClient {
    let config = ClientConfig::new(key)
        .with_base_url(format!("http://{addr}/"))
        .with_timeout(Duration::from_secs(5));
    FirmApiClient::from_config(config)
}

#[test]
fn registry_lifecycle() {
    let addr = start_server();
    let client = client(addr, mock_server::VALID_KEY);

    // Step 1: lookups by each identifier.
    let company = client.companies().by_ico("51636549").unwrap();
    assert_eq!(company["data"]["name"], "Version Two s. r. o.");

    let company = client.companies().by_orsr_id("427482").unwrap();
    assert_eq!(company["data"]["ico"], "51636549");

    let company = client.companies().by_id(3).unwrap();
    assert_eq!(company["data"]["ico"], "31322832");

    // Step 2: autocomplete limit above the cap is clamped, so the server accepts it.
    let found = client.search().autocomplete("version", 50).unwrap();
    assert_eq!(found["results"].as_array().map(Vec::len), Some(2));

    // Step 3: name search, exact and fuzzy.
    let fuzzy = client.search().by_name("version", false, Page::default()).unwrap();
    assert_eq!(fuzzy["meta"]["total"], 2);
    let exact = client
        .search()
        .by_name("Version Two s. r. o.", true, Page::default())
        .unwrap();
    assert_eq!(exact["meta"]["total"], 1);

    // Step 4: partial IČO with paging.
    let by_ico = client
        .search()
        .by_ico("5163", Page { limit: 1, offset: 1 })
        .unwrap();
    assert_eq!(by_ico["meta"]["total"], 2);
    assert_eq!(by_ico["data"][0]["ico"], "51636590");

    // Step 5: advanced search.
    let advanced = client
        .search()
        .advanced(&[("city", "Bratislava".into()), ("legal_form", "a.s.".into())])
        .unwrap();
    assert_eq!(advanced["meta"]["total"], 2);

    // Step 6: batch job submit, poll, fetch.
    let job = client.batch().by_ico(["51636549", "00000000"]).unwrap();
    let batch_id = job["batch_id"].as_str().unwrap().to_string();
    let status = client.batch().status(&batch_id).unwrap();
    assert_eq!(status["status"], "completed");
    let results = client.batch().results(&batch_id).unwrap();
    assert_eq!(results["results"][0]["found"], true);
    assert_eq!(results["results"][1]["found"], false);

    let job = client.batch().by_names(["Tatra banka, a.s."]).unwrap();
    let results = client
        .batch()
        .results(job["batch_id"].as_str().unwrap())
        .unwrap();
    assert_eq!(results["results"][0]["data"]["ico"], "31322832");

    // Step 7: account endpoints.
    let usage = client.account().usage().unwrap();
    assert_eq!(usage["plan"], "starter");
    let quota = client.account().quota().unwrap();
    assert!(quota["remaining"].as_u64().unwrap() < 1000);
    let history = client.account().history().unwrap();
    assert!(history["history"].is_array());
}

#[test]
fn error_taxonomy_over_http() {
    let addr = start_server();
    let client = client(addr, mock_server::VALID_KEY);

    let err = client.companies().by_ico("123").unwrap_err();
    assert_eq!(err.status_code(), 422);
    assert_eq!(err.message(), "Validation failed");
    assert_eq!(err.field_errors("ico"), ["The ico must be 8 characters.".to_string()]);
    assert!(err.field_errors("nonexistent").is_empty());

    let err = client.companies().by_ico("00000000").unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::NotFound);
    assert_eq!(err.message(), "Not found: Company not found");

    let err = client.companies().by_ico(mock_server::FAULTY_ICO).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::Generic);
    assert_eq!(err.status_code(), 500);
    assert_eq!(err.message(), "Internal server error");

    let err = client.batch().status("not-a-batch").unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::NotFound);

    let err = client
        .executor()
        .execute(HttpMethod::Get, "/nope", &[], None)
        .unwrap_err();
    assert_eq!(err.message(), "Not found: Endpoint not found");
}

#[test]
fn authentication_and_plan_errors() {
    let addr = start_server();

    let err = client(addr, "wrong-key").account().usage().unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::Authentication);
    assert_eq!(err.status_code(), 401);
    assert_eq!(err.message(), "Invalid API key");

    let free = client(addr, mock_server::FREE_TIER_KEY);
    let err = free.batch().by_ico(["51636549"]).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::Forbidden);
    assert_eq!(
        err.message(),
        "Forbidden: Batch lookup requires Starter plan or higher"
    );
    assert_eq!(free.account().usage().unwrap()["plan"], "free");
}

#[test]
fn rate_limit_carries_retry_after() {
    let addr = start_server();
    let err = client(addr, mock_server::RATE_LIMITED_KEY)
        .companies()
        .by_ico("51636549")
        .unwrap_err();

    assert_eq!(err.status_code(), 429);
    assert_eq!(err.retry_after(), Some(mock_server::RATE_LIMIT_RETRY_AFTER));
    assert!(err.is_retryable());
}

#[test]
fn connection_refused_is_network_error() {
    // Bind then drop to get a port nothing listens on.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let err = client(addr, mock_server::VALID_KEY)
        .account()
        .usage()
        .unwrap_err();

    assert_eq!(err.kind(), &ErrorKind::Network);
    assert_eq!(err.status_code(), 0);
    assert!(err.message().starts_with("Network error: "), "{}", err.message());
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn large_response_body_is_decoded() {
    let padding = "x".repeat(11 * 1024 * 1024);
    let body = format!(r#"{{"plan":"starter","padding":"{padding}"}}"#);
    let addr = serve_once(move |mut stream| {
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        stream.write_all(head.as_bytes()).unwrap();
        stream.write_all(body.as_bytes()).unwrap();
    });

    let usage = client(addr, mock_server::VALID_KEY).account().usage().unwrap();
    assert_eq!(usage["plan"], "starter");
    assert_eq!(usage["padding"].as_str().map(str::len), Some(11 * 1024 * 1024));
}

#[test]
fn stalled_server_times_out_as_network_error() {
    let addr = serve_once(|stream| {
        std::thread::sleep(Duration::from_secs(3));
        drop(stream);
    });
    let config = ClientConfig::new(mock_server::VALID_KEY)
        .with_base_url(format!("http://{addr}"))
        .with_timeout(Duration::from_millis(500));

    let started = Instant::now();
    let err = FirmApiClient::from_config(config)
        .account()
        .usage()
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(3), "{:?}", started.elapsed());
    assert_eq!(err.kind(), &ErrorKind::Network);
    assert_eq!(err.status_code(), 0);
    assert!(err.message().starts_with("Network error: "), "{}", err.message());
}
