//! End-to-end exchanges: raw request bytes in, raw response bytes out,
//! against a temporary document root.

use std::path::Path;
use std::sync::Arc;

use statikd::config::ServeContext;
use statikd::http::conditional::http_date;
use statikd::http::mime::MimeMap;
use statikd::server::{serve_connection, ConnectionLimits};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const DATA_LEN: usize = 2345;

struct Fixture {
    dir: tempfile::TempDir,
    data: Vec<u8>,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let data: Vec<u8> = (0..DATA_LEN).map(|i| (i % 251) as u8).collect();
        std::fs::create_dir(dir.path().join("dir")).unwrap();
        std::fs::write(dir.path().join("data.jpeg"), &data).unwrap();
        std::fs::write(dir.path().join("escape#this"), vec![b'x'; 12345]).unwrap();
        Self { dir, data }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn context(&self) -> Arc<ServeContext> {
        Arc::new(ServeContext::new(
            self.root(),
            MimeMap::default(),
            "statikd/test",
        ))
    }

    /// Send `request` and return everything the server wrote
    async fn exchange(&self, request: &[u8]) -> Vec<u8> {
        let (mut client, server) = tokio::io::duplex(64 * 1024);
        let task = tokio::spawn(serve_connection(
            server,
            self.context(),
            ConnectionLimits::default(),
            "127.0.0.1".to_string(),
        ));

        client.write_all(request).await.unwrap();
        let mut raw = Vec::new();
        client.read_to_end(&mut raw).await.unwrap();
        task.await.unwrap().unwrap();
        raw
    }

    async fn get(&self, request: &str) -> Reply {
        Reply::parse(&self.exchange(request.as_bytes()).await)
    }
}

struct Reply {
    status: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Reply {
    fn parse(raw: &[u8]) -> Self {
        let split = raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("response has a header block");
        let head = std::str::from_utf8(&raw[..split]).unwrap();
        let mut lines = head.split("\r\n");
        let status = lines.next().unwrap().to_string();
        let headers = lines
            .map(|line| {
                let (name, value) = line.split_once(": ").unwrap();
                (name.to_string(), value.to_string())
            })
            .collect();
        Self {
            status,
            headers,
            body: raw[split + 4..].to_vec(),
        }
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn request(url: &str, version: &str, eol: &str, headers: &[(&str, &str)]) -> String {
    let mut raw = format!("GET {url} HTTP/{version}{eol}");
    for (name, value) in headers {
        raw.push_str(&format!("{name}: {value}{eol}"));
    }
    raw.push_str(eol);
    raw
}

#[tokio::test]
async fn test_index_forms() {
    let fixture = Fixture::new();
    for url in ["/", "/dir/../", "//dir///..////", "/dir/.."] {
        for version in ["1.0", "1.1"] {
            for eol in ["\n", "\r\n"] {
                let reply = fixture.get(&request(url, version, eol, &[])).await;
                assert_eq!(reply.status, "HTTP/1.1 200 OK", "{url} {version}");
                let page = reply.text();
                assert!(page.contains(&format!("<title>{url}</title>\n")), "{url}");
                assert!(page.contains(&format!("<h1>{url}</h1>\n")), "{url}");
                assert!(page.contains("Generated by statikd/test"), "{url}");
                assert!(page.contains("<a href=\"..\">..</a>/\n"), "{url}");
                assert_eq!(
                    reply.header("Content-Length"),
                    Some(reply.body.len().to_string().as_str())
                );
            }
        }
    }
}

#[tokio::test]
async fn test_bare_request_gets_body_only() {
    let fixture = Fixture::new();
    for eol in ["\n", "\r\n"] {
        let raw = fixture.exchange(format!("GET /{eol}").as_bytes()).await;
        let page = String::from_utf8(raw).unwrap();
        assert!(page.starts_with("<html>"), "{page}");
        assert!(page.contains("<title>/</title>\n"));
        assert!(!page.contains("HTTP/1.1"));
    }
}

#[tokio::test]
async fn test_bare_request_for_file() {
    let fixture = Fixture::new();
    let raw = fixture.exchange(b"GET /data.jpeg\r\n").await;
    assert_eq!(raw, fixture.data);
}

#[tokio::test]
async fn test_invalid_urls() {
    let fixture = Fixture::new();
    for url in ["dir/../", "/../", "/./dir/./../../"] {
        let reply = fixture.get(&request(url, "1.1", "\r\n", &[])).await;
        assert_eq!(reply.status, "HTTP/1.1 400 Bad Request", "{url}");
        assert_eq!(reply.header("Connection"), Some("close"));
        let page = reply.text();
        assert!(page.contains("<title>400 Bad Request</title>"), "{url}");
        assert!(page.contains("<h1>Bad Request</h1>\n"), "{url}");
        assert!(
            page.contains(&format!("You requested an invalid URL: {url}\n")),
            "{url}"
        );
        assert!(page.contains("Generated by statikd/test"), "{url}");
    }
}

#[tokio::test]
async fn test_listing_escapes_names() {
    let fixture = Fixture::new();
    let reply = fixture.get(&request("/", "1.0", "\r\n", &[])).await;
    let page = reply.text();
    assert!(page.contains("escape%23this"));
    assert!(page.contains("12345"));
    assert!(page.contains("<a href=\"dir/\">dir</a>/"));

    let reply = fixture.get(&request("/dir/", "1.0", "\r\n", &[])).await;
    assert!(reply.text().contains("<a href=\"..\">..</a>/"));
}

/// Relative links of a listing, parent link excluded
fn listing_hrefs(page: &str) -> Vec<String> {
    page.split("<a href=\"")
        .skip(1)
        .filter_map(|rest| rest.split_once('"'))
        .map(|(href, _)| href.to_string())
        .filter(|href| href != "..")
        .collect()
}

#[tokio::test]
async fn test_listing_links_can_be_followed() {
    let fixture = Fixture::new();
    let page = fixture.get(&request("/", "1.1", "\r\n", &[])).await.text();
    let hrefs = listing_hrefs(&page);
    assert_eq!(hrefs, vec!["data%2Ejpeg", "dir/", "escape%23this"]);

    for href in &hrefs {
        let reply = fixture.get(&request(&format!("/{href}"), "1.1", "\r\n", &[])).await;
        assert_eq!(reply.status, "HTTP/1.1 200 OK", "{href}");
    }

    let reply = fixture.get(&request("/data%2Ejpeg", "1.1", "\r\n", &[])).await;
    assert_eq!(reply.body, fixture.data);
    assert_eq!(reply.header("Content-Type"), Some("image/jpeg"));
}

#[tokio::test]
async fn test_escaped_traversal_is_rejected() {
    let fixture = Fixture::new();
    for url in ["/%2e%2e/", "/dir/%2E%2E/%2e%2e/"] {
        let reply = fixture.get(&request(url, "1.1", "\r\n", &[])).await;
        assert_eq!(reply.status, "HTTP/1.1 400 Bad Request", "{url}");
        assert!(reply
            .text()
            .contains(&format!("You requested an invalid URL: {url}\n")));
    }
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_non_utf8_name_through_listing() {
    use std::os::unix::ffi::OsStrExt;

    let fixture = Fixture::new();
    let name = std::ffi::OsStr::from_bytes(b"caf\xe9");
    std::fs::write(fixture.root().join(name), b"latin-1").unwrap();

    let page = fixture.get(&request("/", "1.1", "\r\n", &[])).await.text();
    assert!(listing_hrefs(&page).contains(&"caf%E9".to_string()));

    let reply = fixture.get(&request("/caf%E9", "1.1", "\r\n", &[])).await;
    assert_eq!(reply.status, "HTTP/1.1 200 OK");
    assert_eq!(reply.body, b"latin-1");
}

#[tokio::test]
async fn test_get_file_headers_in_order() {
    let fixture = Fixture::new();
    let reply = fixture.get(&request("/data.jpeg", "1.1", "\r\n", &[])).await;
    assert_eq!(reply.status, "HTTP/1.1 200 OK");
    assert_eq!(reply.body, fixture.data);

    let names: Vec<&str> = reply.headers.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Date",
            "Server",
            "Accept-Ranges",
            "Connection",
            "Content-Length",
            "Content-Type",
            "Last-Modified",
        ]
    );
    assert_eq!(reply.header("Server"), Some("statikd/test"));
    assert_eq!(reply.header("Accept-Ranges"), Some("bytes"));
    assert_eq!(reply.header("Content-Length"), Some("2345"));
    assert_eq!(reply.header("Content-Type"), Some("image/jpeg"));

    let modified = std::fs::metadata(fixture.root().join("data.jpeg"))
        .unwrap()
        .modified()
        .unwrap();
    assert_eq!(reply.header("Last-Modified"), Some(http_date(modified).as_str()));
}

#[tokio::test]
async fn test_head_matches_get() {
    let fixture = Fixture::new();
    let get = fixture.get(&request("/data.jpeg", "1.1", "\r\n", &[])).await;
    let head = fixture.get("HEAD /data.jpeg HTTP/1.1\r\n\r\n").await;

    assert_eq!(head.status, get.status);
    assert!(head.body.is_empty());
    for name in ["Accept-Ranges", "Content-Length", "Content-Type", "Last-Modified"] {
        assert_eq!(head.header(name), get.header(name), "{name}");
    }
}

#[tokio::test]
async fn test_if_modified_since() {
    let fixture = Fixture::new();
    let first = fixture.get(&request("/data.jpeg", "1.1", "\r\n", &[])).await;
    let last_modified = first.header("Last-Modified").unwrap().to_string();

    let reply = fixture
        .get(&request(
            "/data.jpeg",
            "1.1",
            "\r\n",
            &[("If-Modified-Since", &last_modified)],
        ))
        .await;
    assert_eq!(reply.status, "HTTP/1.1 304 Not Modified");
    assert!(reply.body.is_empty());
    assert!(reply.header("Last-Modified").is_none());
    assert!(reply.header("Content-Length").is_none());
    assert!(reply.header("Content-Type").is_none());
    assert_eq!(reply.header("Accept-Ranges"), Some("bytes"));

    // A range does not turn a 304 back into content
    let reply = fixture
        .get(&request(
            "/data.jpeg",
            "1.1",
            "\r\n",
            &[("If-Modified-Since", &last_modified), ("Range", "bytes=10-20")],
        ))
        .await;
    assert_eq!(reply.status, "HTTP/1.1 304 Not Modified");
    assert!(reply.header("Content-Range").is_none());

    let reply = fixture
        .get(&request(
            "/data.jpeg",
            "1.1",
            "\r\n",
            &[("If-Modified-Since", "Thu, 01 Jan 1970 00:00:00 GMT")],
        ))
        .await;
    assert_eq!(reply.status, "HTTP/1.1 200 OK");
}

async fn range_reply(fixture: &Fixture, range: &str) -> Reply {
    let value = format!("bytes={range}");
    fixture
        .get(&request("/data.jpeg", "1.0", "\r\n", &[("Range", &value)]))
        .await
}

#[tokio::test]
async fn test_partial_content() {
    let fixture = Fixture::new();
    let bad_end = format!("{}-{}", DATA_LEN - 25, DATA_LEN * 2);
    let cases = [
        ("10-20", 10, 20),
        ("10-", 10, DATA_LEN - 1),
        ("-25", DATA_LEN - 25, DATA_LEN - 1),
        // End past the file is clamped
        (bad_end.as_str(), DATA_LEN - 25, DATA_LEN - 1),
    ];

    for (range, start, end) in cases {
        let reply = range_reply(&fixture, range).await;
        assert_eq!(reply.status, "HTTP/1.1 206 Partial Content", "{range}");
        assert_eq!(
            reply.header("Content-Range"),
            Some(format!("bytes {start}-{end}/{DATA_LEN}").as_str()),
            "{range}"
        );
        assert_eq!(
            reply.header("Content-Length"),
            Some((end - start + 1).to_string().as_str())
        );
        assert_eq!(reply.body, &fixture.data[start..=end], "{range}");
    }
}

#[tokio::test]
async fn test_head_with_range() {
    let fixture = Fixture::new();
    let reply = fixture
        .get("HEAD /data.jpeg HTTP/1.1\r\nRange: bytes=10-20\r\n\r\n")
        .await;
    assert_eq!(reply.status, "HTTP/1.1 206 Partial Content");
    assert_eq!(reply.header("Content-Range"), Some("bytes 10-20/2345"));
    assert_eq!(reply.header("Content-Length"), Some("11"));
    assert_eq!(reply.header("Content-Type"), Some("image/jpeg"));
    assert!(reply.header("Last-Modified").is_some());
    assert!(reply.body.is_empty());
}

#[tokio::test]
async fn test_range_bad_start() {
    let fixture = Fixture::new();
    let past_end = format!("{}-", DATA_LEN * 2);
    for range in [past_end.as_str(), "99999999999999999999-"] {
        let reply = range_reply(&fixture, range).await;
        assert_eq!(
            reply.status,
            "HTTP/1.1 416 Requested Range Not Satisfiable",
            "{range}"
        );
        assert!(reply.header("Content-Range").is_none());
        assert!(reply.body.is_empty());
    }
}

#[tokio::test]
async fn test_unparseable_range_serves_whole_file() {
    let fixture = Fixture::new();
    let reply = fixture
        .get(&request("/data.jpeg", "1.1", "\r\n", &[("Range", "pages=1-2")]))
        .await;
    assert_eq!(reply.status, "HTTP/1.1 200 OK");
    assert_eq!(reply.body.len(), DATA_LEN);
}

#[tokio::test]
async fn test_not_found_and_bad_method() {
    let fixture = Fixture::new();
    let reply = fixture.get(&request("/missing", "1.1", "\r\n", &[])).await;
    assert_eq!(reply.status, "HTTP/1.1 404 Not Found");

    let reply = fixture.get("POST / HTTP/1.1\r\n\r\n").await;
    assert_eq!(reply.status, "HTTP/1.1 400 Bad Request");
}

#[tokio::test]
async fn test_malformed_request_line() {
    let fixture = Fixture::new();
    let reply = fixture.get("GET / HTTP/2.0\r\n\r\n").await;
    assert_eq!(reply.status, "HTTP/1.1 400 Bad Request");
    assert_eq!(reply.header("Server"), Some("statikd/test"));
}

#[tokio::test]
async fn test_oversized_head_is_rejected() {
    let fixture = Fixture::new();
    let long_url = format!("/{}", "a".repeat(10_000));
    let raw = fixture
        .exchange(request(&long_url, "1.1", "\r\n", &[]).as_bytes())
        .await;
    assert!(raw.starts_with(b"HTTP/1.1 400 Bad Request\r\n"));
}
