use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::NaiveDate;
use monthly_outlook::config::NseConfig;
use monthly_outlook::model::{DateRange, PriceObservation};
use monthly_outlook::nse::NseRestClient;

const HISTORY_BODY: &str = r#"{"data":[
    {"CH_TIMESTAMP":"2024-01-02","CH_SERIES":"EQ","CH_CLOSING_PRICE":101.5},
    {"CH_TIMESTAMP":"2024-01-03","CH_SERIES":"BE","CH_CLOSING_PRICE":99.0},
    {"CH_TIMESTAMP":"2024-01-04","CH_SERIES":"EQ","CH_CLOSING_PRICE":"102.25"}
]}"#;

/// Minimal HTTP/1.1 server: the home page always answers 200, API calls take
/// the next scripted `(status, body)`. Every request path is recorded.
struct FakeNse {
    base_url: String,
    paths: Arc<Mutex<Vec<String>>>,
}

impl FakeNse {
    fn start(api_responses: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let paths = Arc::new(Mutex::new(Vec::new()));
        let script = Arc::new(Mutex::new(VecDeque::from(api_responses)));

        let seen = Arc::clone(&paths);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                serve_one(stream, &seen, &script);
            }
        });
        Self { base_url, paths }
    }

    fn home_hits(&self) -> usize {
        self.paths.lock().unwrap().iter().filter(|p| *p == "/").count()
    }

    fn api_hits(&self) -> usize {
        self.paths
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.starts_with("/api/historical/cm/equity"))
            .count()
    }

    fn config(&self) -> NseConfig {
        NseConfig {
            base_url: self.base_url.clone(),
            retry_sleep_ms: 0,
            timeout_secs: 5,
            ..NseConfig::default()
        }
    }
}

fn serve_one(
    mut stream: TcpStream,
    seen: &Mutex<Vec<String>>,
    script: &Mutex<VecDeque<(u16, &'static str)>>,
) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }
    let head = String::from_utf8_lossy(&request);
    let path = head
        .split_whitespace()
        .nth(1)
        .unwrap_or_default()
        .to_string();
    seen.lock().unwrap().push(path.clone());

    let (status, body) = if path == "/" {
        (200, "<html></html>")
    } else {
        script.lock().unwrap().pop_front().unwrap_or((500, ""))
    };
    let reason = match status {
        200 => "OK",
        403 => "Forbidden",
        503 => "Service Unavailable",
        _ => "Error",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn january_window() -> DateRange {
    DateRange::new(d(2024, 1, 1), d(2024, 1, 10)).unwrap()
}

#[test]
/// A 403 drops the session, the home page is visited again and the retry
/// returns the EQ rows.
fn forbidden_response_rebootstraps_session_and_retries() {
    let server = FakeNse::start(vec![(403, ""), (200, HISTORY_BODY)]);
    let client = NseRestClient::new(&server.config()).unwrap();

    let obs = client.fetch_history("pfc", &january_window()).unwrap();

    assert_eq!(
        obs,
        vec![
            PriceObservation::new(d(2024, 1, 2), 101.5),
            PriceObservation::new(d(2024, 1, 4), 102.25),
        ]
    );
    assert_eq!(server.api_hits(), 2);
    assert_eq!(server.home_hits(), 2);
}

#[test]
fn persistent_failure_reports_attempt_count() {
    let server = FakeNse::start(vec![(503, ""), (503, ""), (503, "")]);
    let client = NseRestClient::new(&server.config()).unwrap();

    let err = client.fetch_history("RVNL", &january_window()).unwrap_err();

    let chain = format!("{:#}", err);
    assert!(chain.contains("after 3 attempts"), "{}", chain);
    assert!(chain.contains("status 503"), "{}", chain);
    assert_eq!(server.api_hits(), 3);
    // 503 keeps the session, so only the first call bootstraps it.
    assert_eq!(server.home_hits(), 1);
}

#[test]
/// Each 40-day window is a separate request.
fn long_range_is_fetched_per_window() {
    let empty = r#"{"data":[]}"#;
    let server = FakeNse::start(vec![(200, empty), (200, empty), (200, empty)]);
    let client = NseRestClient::new(&server.config()).unwrap();

    let range = DateRange::new(d(2024, 1, 1), d(2024, 3, 31)).unwrap();
    let obs = client.fetch_history("ETERNAL", &range).unwrap();

    assert!(obs.is_empty());
    assert_eq!(server.api_hits(), 3);
    let paths = server.paths.lock().unwrap().clone();
    assert!(paths.iter().any(|p| p.contains("from=10-02-2024")));
}
