//! HTTP backend for the persistence service.
//!
//! The service exposes `GET /tabs` (all rows) and `POST /tabs` (upsert one
//! row). `DELETE /tabs/{id}` is only used when delete propagation is enabled.

use crate::backend::SyncBackend;
use crate::error::SyncError;
use crate::record::TabRecord;
use std::time::Duration;
use ureq::Agent;
use ureq::tls::{RootCerts, TlsConfig, TlsProvider};
use url::Url;

/// Maximum response body size for `GET /tabs` (32 MB).
pub const MAX_RESPONSE_SIZE: u64 = 32 * 1024 * 1024;

const USER_AGENT: &str = "par-notes";

/// Validate a base URL for the persistence service.
///
/// Only `http` and `https` are accepted; the service is usually local.
pub fn validate_base_url(url: &str) -> Result<Url, SyncError> {
    let parsed = Url::parse(url).map_err(|e| SyncError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(SyncError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{scheme}', expected http or https"),
            });
        }
    }

    if parsed.cannot_be_a_base() {
        return Err(SyncError::InvalidUrl {
            url: url.to_string(),
            reason: "URL cannot be used as a base".to_string(),
        });
    }

    Ok(parsed)
}

/// Create a new HTTP agent configured with native-tls and a global timeout.
pub fn agent(timeout: Duration) -> Agent {
    let tls_config = TlsConfig::builder()
        .provider(TlsProvider::NativeTls)
        .root_certs(RootCerts::PlatformVerifier)
        .build();

    Agent::config_builder()
        .tls_config(tls_config)
        .timeout_global(Some(timeout))
        .build()
        .into()
}

/// `SyncBackend` speaking JSON over HTTP.
pub struct HttpBackend {
    agent: Agent,
    base: Url,
}

impl HttpBackend {
    /// Build a backend for `base_url` (e.g. `http://localhost:8080`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SyncError> {
        let base = validate_base_url(base_url)?;
        log::info!("Persistence service at {}", base);
        Ok(Self {
            agent: agent(timeout),
            base,
        })
    }

    /// URL for `/tabs` plus optional extra path segments
    fn endpoint(&self, extra: &[&str]) -> Result<Url, SyncError> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| SyncError::InvalidUrl {
                url: self.base.to_string(),
                reason: "URL cannot be used as a base".to_string(),
            })?;
            segments.pop_if_empty().push("tabs");
            for segment in extra {
                segments.push(segment);
            }
        }
        Ok(url)
    }
}

fn map_ureq_error(url: &Url, e: ureq::Error) -> SyncError {
    match e {
        ureq::Error::StatusCode(status) => SyncError::Status {
            url: url.to_string(),
            status,
        },
        other => SyncError::Transport {
            url: url.to_string(),
            message: other.to_string(),
        },
    }
}

impl SyncBackend for HttpBackend {
    fn fetch_all(&self) -> Result<Vec<TabRecord>, SyncError> {
        let url = self.endpoint(&[])?;
        let body = self
            .agent
            .get(url.as_str())
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| map_ureq_error(&url, e))?
            .into_body()
            .with_config()
            .limit(MAX_RESPONSE_SIZE)
            .read_to_string()
            .map_err(|e| map_ureq_error(&url, e))?;

        let records: Vec<TabRecord> = serde_json::from_str(&body)?;
        log::info!("Fetched {} rows from {}", records.len(), url);
        Ok(records)
    }

    fn upsert(&self, record: &TabRecord) -> Result<(), SyncError> {
        let url = self.endpoint(&[])?;
        let body = serde_json::to_string(record)?;
        self.agent
            .post(url.as_str())
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", "application/json")
            .send(body.as_bytes())
            .map_err(|e| map_ureq_error(&url, e))?;
        log::trace!("Upserted {}", record.id);
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), SyncError> {
        let url = self.endpoint(&[id])?;
        self.agent
            .delete(url.as_str())
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| map_ureq_error(&url, e))?;
        log::trace!("Deleted {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::JoinHandle;

    /// Request line and body of one request received by [`serve`]
    struct Captured {
        request_line: String,
        body: String,
    }

    /// Answer one request per connection with the given `(status, body)`
    /// pairs, in order, on a loopback port.
    fn serve(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<Captured>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            responses
                .into_iter()
                .map(|(status, body)| {
                    let (mut stream, _) = listener.accept().unwrap();
                    let captured = read_request(&stream);
                    let reason = if status < 400 { "OK" } else { "Error" };
                    let response = format!(
                        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    stream.write_all(response.as_bytes()).unwrap();
                    stream.flush().unwrap();
                    captured
                })
                .collect()
        });
        (base, handle)
    }

    fn read_request(stream: &TcpStream) -> Captured {
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();

        let mut content_length = 0;
        let mut chunked = false;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                let name = name.trim().to_ascii_lowercase();
                if name == "content-length" {
                    content_length = value.trim().parse().unwrap();
                } else if name == "transfer-encoding" {
                    chunked = value.trim().eq_ignore_ascii_case("chunked");
                }
            }
        }

        let mut body = Vec::new();
        if chunked {
            loop {
                let mut size = String::new();
                reader.read_line(&mut size).unwrap();
                let size = usize::from_str_radix(size.trim(), 16).unwrap();
                let mut chunk = vec![0; size + 2];
                reader.read_exact(&mut chunk).unwrap();
                if size == 0 {
                    break;
                }
                body.extend_from_slice(&chunk[..size]);
            }
        } else {
            body.resize(content_length, 0);
            reader.read_exact(&mut body).unwrap();
        }

        Captured {
            request_line: request_line.trim_end().to_string(),
            body: String::from_utf8(body).unwrap(),
        }
    }

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_fetch_all_parses_rows() {
        let (base, server) = serve(vec![(
            200,
            r#"[{"id":"a","title":"A","content":"<p>x</p>","parent_id":null,"created_at":5},
                {"id":"b","title":"B","content":"","parent_id":"win-a","created_at":6}]"#,
        )]);

        let rows = backend(&base).fetch_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].parent_id, None);
        assert_eq!(rows[1].parent_id.as_deref(), Some("win-a"));
        assert_eq!(rows[1].created_at, 6);

        let requests = server.join().unwrap();
        assert!(requests[0].request_line.starts_with("GET /tabs "));
    }

    #[test]
    fn test_upsert_posts_row_as_json() {
        let (base, server) = serve(vec![(200, "{}")]);
        let record = TabRecord {
            id: "b".to_string(),
            title: "B".to_string(),
            content: "<p>body</p>".to_string(),
            parent_id: Some("win-a".to_string()),
            created_at: 6,
        };

        backend(&base).upsert(&record).unwrap();

        let requests = server.join().unwrap();
        assert!(requests[0].request_line.starts_with("POST /tabs "));
        let sent: TabRecord = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(sent, record);
        let raw: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(raw["parent_id"], "win-a");
        assert_eq!(raw["created_at"], 6);
    }

    #[test]
    fn test_error_status_and_delete_path() {
        let (base, server) = serve(vec![(500, ""), (200, "")]);
        let http = backend(&base);

        let err = http.fetch_all().unwrap_err();
        assert!(matches!(err, SyncError::Status { status: 500, .. }), "{err}");
        http.delete("a b").unwrap();

        let requests = server.join().unwrap();
        assert!(requests[1].request_line.starts_with("DELETE /tabs/a%20b "));
    }

    #[test]
    fn test_validate_accepts_http_and_https() {
        assert!(validate_base_url("http://localhost:8080").is_ok());
        assert!(validate_base_url("https://notes.example.com/api").is_ok());
    }

    #[test]
    fn test_validate_rejects_other_schemes() {
        let err = validate_base_url("ftp://example.com").unwrap_err();
        assert!(matches!(err, SyncError::InvalidUrl { .. }));
        assert!(validate_base_url("not a url").is_err());
    }

    #[test]
    fn test_endpoint_paths() {
        let backend = HttpBackend::new("http://localhost:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            backend.endpoint(&[]).unwrap().as_str(),
            "http://localhost:8080/tabs"
        );

        let nested = HttpBackend::new("http://host/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            nested.endpoint(&["a b"]).unwrap().as_str(),
            "http://host/api/tabs/a%20b"
        );
    }
}
