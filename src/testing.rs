//! In-process HTTP server and scratch paths for unit tests.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub fn scratch_path(name: &str) -> PathBuf {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    let n = NEXT.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir()
        .join(format!("penguin_overlord_{}_{}", std::process::id(), n))
        .join(name)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("test client")
}

pub struct Canned {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
}

impl Canned {
    pub fn ok(body: impl Into<String>) -> Self {
        Self { status: 200, headers: Vec::new(), body: body.into() }
    }

    pub fn status(status: u16) -> Self {
        Self { status, headers: Vec::new(), body: String::new() }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

/// Receives the raw request head (request line + headers).
pub type Handler = Arc<dyn Fn(&str) -> Canned + Send + Sync>;

pub struct TestServer {
    pub base: String,
    pub hits: Arc<AtomicUsize>,
    pub peak: Arc<AtomicUsize>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

pub async fn serve(delay: Duration, handler: Handler) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let hits = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let in_flight = Arc::new(AtomicUsize::new(0));

    let (hits_c, peak_c) = (hits.clone(), peak.clone());
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else { break };
            let handler = handler.clone();
            let (hits, peak, in_flight) = (hits_c.clone(), peak_c.clone(), in_flight.clone());
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                hits.fetch_add(1, Ordering::SeqCst);
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(delay).await;

                let canned = handler(&String::from_utf8_lossy(&buf));
                let mut head = format!(
                    "HTTP/1.1 {} X\r\nContent-Length: {}\r\nConnection: close\r\n",
                    canned.status,
                    canned.body.len()
                );
                for (name, value) in &canned.headers {
                    head.push_str(&format!("{name}: {value}\r\n"));
                }
                head.push_str("\r\n");
                in_flight.fetch_sub(1, Ordering::SeqCst);
                let _ = stream.write_all(head.as_bytes()).await;
                let _ = stream.write_all(canned.body.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    TestServer { base: format!("http://{addr}"), hits, peak }
}

/// Minimal RSS 2.0 document. Items are (guid, title, description, pubDate).
pub fn rss(items: &[(&str, &str, &str, Option<String>)]) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel><title>Test</title><link>https://example.org/</link><description>t</description>",
    );
    for (guid, title, desc, date) in items {
        out.push_str("<item>");
        out.push_str(&format!("<guid>{guid}</guid><title>{title}</title>"));
        out.push_str(&format!("<link>https://example.org/{guid}</link>"));
        out.push_str(&format!("<description><![CDATA[{desc}]]></description>"));
        if let Some(date) = date {
            out.push_str(&format!("<pubDate>{date}</pubDate>"));
        }
        out.push_str("</item>");
    }
    out.push_str("</channel></rss>");
    out
}
