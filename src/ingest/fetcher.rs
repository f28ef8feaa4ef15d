use reqwest::blocking::Client;
use serde_json::Value;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, debug};

use crate::error::{EtlError, EtlResult};
use crate::utils::config::AppConfig;

/// One artifact object exactly as the API returned it.
pub type RawRecord = Value;

/// The API refuses page sizes above this.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Anything that can hand out one page of raw records.
pub trait RecordSource {
    fn fetch_page(&self, classification: &str, page_size: u32, page: u32) -> EtlResult<Vec<RawRecord>>;
}

pub struct ArtifactClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ArtifactClient {
    pub fn new(config: &AppConfig) -> EtlResult<Self> {
        let api_key = config.require_api_key()?.to_string();
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Fetches a single page of objects for `classification`.
    /// `page_size` is clamped to `1..=MAX_PAGE_SIZE`; `page` starts at 1.
    pub fn fetch(&self, classification: &str, page_size: u32, page: u32) -> EtlResult<Vec<RawRecord>> {
        if page == 0 {
            return Err(EtlError::InvalidArgument("page numbers start at 1".to_string()));
        }
        let size = page_size.clamp(1, MAX_PAGE_SIZE).to_string();
        let page_str = page.to_string();
        let url = format!("{}/object", self.base_url);

        debug!("GET {} classification={} size={} page={}", url, classification, size, page);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("classification", classification),
                ("size", size.as_str()),
                ("page", page_str.as_str()),
            ])
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            return Err(EtlError::RemoteService {
                status: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            });
        }

        let text = resp.text()?;
        extract_records(&text)
    }
}

impl RecordSource for ArtifactClient {
    fn fetch_page(&self, classification: &str, page_size: u32, page: u32) -> EtlResult<Vec<RawRecord>> {
        self.fetch(classification, page_size, page)
    }
}

fn extract_records(body: &str) -> EtlResult<Vec<RawRecord>> {
    let parsed: Value = serde_json::from_str(body)
        .map_err(|e| EtlError::MalformedBody(e.to_string()))?;

    match parsed.get("records") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(records)) => Ok(records.clone()),
        Some(other) => Err(EtlError::MalformedBody(format!(
            "'records' is not an array: {}",
            other
        ))),
    }
}

/// Fetches pages `1..=pages` one after another and concatenates them in page order.
pub fn collect_pages<S: RecordSource + ?Sized>(
    source: &S,
    classification: &str,
    page_size: u32,
    pages: u32,
) -> EtlResult<Vec<RawRecord>> {
    let bar = ProgressBar::new(u64::from(pages));
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:30}] page {pos}/{len} {msg}") {
        bar.set_style(style);
    }

    let mut all_records = Vec::new();
    for page in 1..=pages {
        let records = source.fetch_page(classification, page_size, page)?;
        info!("Fetched page {} of {} ({} records)", page, pages, records.len());
        all_records.extend(records);
        bar.set_message(format!("{} records", all_records.len()));
        bar.inc(1);
    }
    bar.finish_and_clear();

    Ok(all_records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    struct FakePages {
        sizes: Vec<usize>,
        calls: RefCell<Vec<u32>>,
    }

    impl RecordSource for FakePages {
        fn fetch_page(&self, _classification: &str, _page_size: u32, page: u32) -> EtlResult<Vec<RawRecord>> {
            self.calls.borrow_mut().push(page);
            let count = self.sizes.get(page as usize - 1).copied().unwrap_or(0);
            Ok((0..count).map(|i| json!({ "page": page, "slot": i })).collect())
        }
    }

    /// Serves exactly one HTTP response and hands back the raw request text.
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        serve_raw(format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        ))
    }

    fn serve_raw(response: String) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let n = stream.read(&mut buf).unwrap();
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&buf[..n]).to_string()
        });
        (format!("http://{}", addr), handle)
    }

    fn client_for(base_url: String) -> ArtifactClient {
        let config = AppConfig {
            api_base_url: base_url,
            api_key: Some("test-key".to_string()),
            ..AppConfig::default()
        };
        ArtifactClient::new(&config).unwrap()
    }

    #[test]
    fn test_collect_pages_concatenates_in_order() {
        let source = FakePages { sizes: vec![3, 3, 1], calls: RefCell::new(Vec::new()) };
        let records = collect_pages(&source, "Paintings", 3, 3).unwrap();

        assert_eq!(records.len(), 7);
        assert_eq!(*source.calls.borrow(), vec![1, 2, 3]);
        let order: Vec<(i64, i64)> = records
            .iter()
            .map(|r| (r["page"].as_i64().unwrap(), r["slot"].as_i64().unwrap()))
            .collect();
        assert_eq!(order, vec![(1, 0), (1, 1), (1, 2), (2, 0), (2, 1), (2, 2), (3, 0)]);
    }

    #[test]
    fn test_collect_pages_short_result_set() {
        let source = FakePages { sizes: vec![2], calls: RefCell::new(Vec::new()) };
        let records = collect_pages(&source, "Coins", 100, 3).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(source.calls.borrow().len(), 3);
    }

    #[test]
    fn test_extract_records_variants() {
        assert_eq!(extract_records(r#"{"records": [{"objectid": 1}]}"#).unwrap().len(), 1);
        assert!(extract_records(r#"{"info": {}}"#).unwrap().is_empty());
        assert!(extract_records(r#"{"records": null}"#).unwrap().is_empty());
        assert!(matches!(extract_records("not json"), Err(EtlError::MalformedBody(_))));
        assert!(matches!(extract_records(r#"{"records": 5}"#), Err(EtlError::MalformedBody(_))));
    }

    #[test]
    fn test_fetch_sends_query_and_parses_records() {
        let (url, server) = serve_once("200 OK", r#"{"records": [{"objectid": 7}, {"objectid": 8}]}"#);
        let client = client_for(url);

        let records = client.fetch("Coins", 500, 2).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["objectid"], 8);

        let request = server.join().unwrap();
        assert!(request.starts_with("GET /object?apikey=test-key&classification=Coins&size=100&page=2 "));
    }

    #[test]
    fn test_fetch_surfaces_http_status() {
        let (url, server) = serve_once("500 Internal Server Error", r#"{"error": "boom"}"#);
        let client = client_for(url);

        let err = client.fetch("Paintings", 10, 1).unwrap_err();
        assert!(matches!(err, EtlError::RemoteService { status: 500, .. }));
        server.join().unwrap();
    }

    #[test]
    fn test_fetch_reports_status_when_error_body_is_cut_short() {
        // promises 100 bytes, sends 4, then hangs up
        let (url, server) = serve_raw(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 100\r\nConnection: close\r\n\r\noops".to_string(),
        );
        let client = client_for(url);

        let err = client.fetch("Paintings", 10, 1).unwrap_err();
        assert!(matches!(err, EtlError::RemoteService { status: 503, .. }));
        server.join().unwrap();
    }

    #[test]
    fn test_fetch_rejects_page_zero() {
        let client = client_for("http://127.0.0.1:9".to_string());
        assert!(matches!(client.fetch("Paintings", 10, 0), Err(EtlError::InvalidArgument(_))));
    }

    #[test]
    fn test_client_needs_api_key() {
        let config = AppConfig::default();
        assert!(matches!(ArtifactClient::new(&config), Err(EtlError::Config(_))));
    }
}
