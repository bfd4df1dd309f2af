use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use once_cell::sync::Lazy;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder, StatusCode, Url};
use tracing::debug;
use crate::config::Config;
use crate::error::{AppError, Result};

const DOCKER_HOST: &str = "host.docker.internal";
const LOOPBACK_HOST: &str = "127.0.0.1";

/// How far into the body a `<meta charset>` declaration is looked for.
const META_SNIFF_LEN: usize = 1024;

// Headers of a desktop Chrome navigation; some news sites refuse anything else.
static BROWSER_HEADERS: Lazy<HeaderMap> = Lazy::new(|| {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        ),
    );
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
        ),
    );
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(header::REFERER, HeaderValue::from_static("https://www.google.com/"));
    headers
});

/// A successfully downloaded page, already decoded to UTF-8.
#[derive(Debug)]
pub struct FetchedPage {
    /// Where the content actually came from, after redirects.
    pub final_url: Url,
    pub html: String,
}

/// Points URLs aimed at Docker's host alias to the loopback address.
///
/// Only the host changes; the rest of the input is kept byte for byte so the
/// result can be reported back as-is.
pub fn rewrite_docker_host(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if parsed.host_str() != Some(DOCKER_HOST) {
        return url.to_string();
    }

    // Lowercasing ASCII keeps byte offsets intact.
    let lowered = url.to_ascii_lowercase();
    let authority_start = lowered.find("://").map(|i| i + 3).unwrap_or(0);
    let authority_end = lowered[authority_start..]
        .find(['/', '?', '#'])
        .map(|i| authority_start + i)
        .unwrap_or(lowered.len());
    // The host follows any userinfo.
    let host_start = lowered[authority_start..authority_end]
        .rfind('@')
        .map(|i| authority_start + i + 1)
        .unwrap_or(authority_start);
    if lowered[host_start..authority_end].starts_with(DOCKER_HOST) {
        let mut rewritten = String::with_capacity(url.len());
        rewritten.push_str(&url[..host_start]);
        rewritten.push_str(LOOPBACK_HOST);
        rewritten.push_str(&url[host_start + DOCKER_HOST.len()..]);
        return rewritten;
    }

    match parsed.set_host(Some(LOOPBACK_HOST)) {
        Ok(()) => parsed.to_string(),
        Err(_) => url.to_string(),
    }
}

pub fn build_client(config: &Config) -> Result<Client> {
    let client = ClientBuilder::new()
        .timeout(config.request_timeout)
        .default_headers(BROWSER_HEADERS.clone())
        .build()?;
    Ok(client)
}

/// Performs the single GET. Anything but a 200 is an error.
pub async fn fetch_html(client: &Client, url: &str) -> Result<FetchedPage> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(AppError::HttpStatus(status));
    }

    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let bytes = response.bytes().await?;
    let html = decode_body(&bytes, content_type.as_deref());
    debug!(
        url = %final_url,
        bytes = bytes.len(),
        chars = html.len(),
        "downloaded page"
    );

    Ok(FetchedPage { final_url, html })
}

/// Decodes a response body, replacing malformed sequences instead of failing.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = detect_encoding(bytes, content_type);
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        debug!(encoding = used.name(), "body contained malformed sequences");
    }
    text.into_owned()
}

/// Picks the body encoding: BOM, then the `Content-Type` charset, then a
/// `<meta>` declaration, then UTF-8 if the bytes validate, else windows-1252.
pub fn detect_encoding(bytes: &[u8], content_type: Option<&str>) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }

    if let Some(encoding) = content_type
        .and_then(charset_from_content_type)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return encoding;
    }

    let head = &bytes[..bytes.len().min(META_SNIFF_LEN)];
    if let Some(encoding) = sniff_meta_charset(head) {
        // A document that could declare itself in ASCII is not UTF-16.
        if encoding == UTF_16LE || encoding == UTF_16BE {
            return UTF_8;
        }
        return encoding;
    }

    if std::str::from_utf8(bytes).is_ok() {
        UTF_8
    } else {
        WINDOWS_1252
    }
}

fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        (!value.is_empty()).then(|| value.to_string())
    })
}

fn sniff_meta_charset(head: &[u8]) -> Option<&'static Encoding> {
    let lowered = String::from_utf8_lossy(head).to_ascii_lowercase();
    let mut rest = lowered.as_str();

    while let Some(start) = rest.find("<meta") {
        let tag = &rest[start..];
        let tag = &tag[..tag.find('>').unwrap_or(tag.len())];

        if let Some(pos) = tag.find("charset=") {
            let value = tag[pos + "charset=".len()..].trim_start_matches(['"', '\'', ' ']);
            let end = value
                .find(|c: char| c == '"' || c == '\'' || c == ';' || c == '/' || c.is_whitespace())
                .unwrap_or(value.len());
            if let Some(encoding) = Encoding::for_label(value[..end].as_bytes()) {
                return Some(encoding);
            }
        }

        rest = &rest[start + tag.len()..];
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_docker_host_only() {
        assert_eq!(
            rewrite_docker_host("http://host.docker.internal:8080/news/1?x=2"),
            "http://127.0.0.1:8080/news/1?x=2"
        );
        assert_eq!(
            rewrite_docker_host("https://example.com/host.docker.internal"),
            "https://example.com/host.docker.internal"
        );
    }

    #[test]
    fn rewrite_keeps_input_shape() {
        // No trailing slash gets added by URL normalization.
        assert_eq!(
            rewrite_docker_host("http://HOST.docker.internal"),
            "http://127.0.0.1"
        );
    }

    #[test]
    fn rewrite_skips_userinfo() {
        let rewritten =
            rewrite_docker_host("http://host.docker.internal@host.docker.internal:8080/a");
        assert_eq!(rewritten, "http://host.docker.internal@127.0.0.1:8080/a");
        assert_eq!(Url::parse(&rewritten).unwrap().host_str(), Some(LOOPBACK_HOST));

        assert_eq!(
            rewrite_docker_host("http://user:pw@host.docker.internal?q=1"),
            "http://user:pw@127.0.0.1?q=1"
        );
    }

    #[test]
    fn unparseable_url_passes_through() {
        assert_eq!(rewrite_docker_host("not a url"), "not a url");
    }

    #[test]
    fn browser_headers_are_complete() {
        for name in [
            header::USER_AGENT,
            header::ACCEPT,
            header::ACCEPT_LANGUAGE,
            header::REFERER,
        ] {
            assert!(BROWSER_HEADERS.contains_key(&name), "missing {name}");
        }
    }

    #[test]
    fn content_type_charset_wins_over_meta() {
        let body = b"<html><head><meta charset=\"utf-8\"></head><body>Caf\xe9</body></html>";
        let encoding = detect_encoding(body, Some("text/html; charset=ISO-8859-1"));
        assert_eq!(encoding, WINDOWS_1252);
        assert!(decode_body(body, Some("text/html; charset=ISO-8859-1")).contains("Café"));
    }

    #[test]
    fn meta_charset_is_sniffed() {
        let body = b"<html><head><meta http-equiv=\"Content-Type\" content=\"text/html; charset=windows-1251\"></head><body>\xcf\xf0\xe8\xe2\xe5\xf2</body></html>";
        assert_eq!(detect_encoding(body, Some("text/html")), encoding_rs::WINDOWS_1251);
        assert!(decode_body(body, None).contains("Привет"));
    }

    #[test]
    fn undeclared_utf8_is_kept() {
        let body = "<p>Grüße aus München</p>".as_bytes();
        assert_eq!(detect_encoding(body, None), UTF_8);
        assert_eq!(decode_body(body, None), "<p>Grüße aus München</p>");
    }

    #[test]
    fn undeclared_invalid_utf8_falls_back_to_latin() {
        let body = b"<p>na\xefve</p>";
        assert_eq!(detect_encoding(body, None), WINDOWS_1252);
        assert_eq!(decode_body(body, None), "<p>naïve</p>");
    }

    #[test]
    fn bom_beats_everything() {
        let mut body = vec![0xEF, 0xBB, 0xBF];
        body.extend_from_slice("<p>ok</p>".as_bytes());
        assert_eq!(detect_encoding(&body, Some("text/html; charset=windows-1252")), UTF_8);
    }

    #[test]
    fn meta_utf16_is_treated_as_utf8() {
        let body = b"<meta charset=\"utf-16\"><p>plain</p>";
        assert_eq!(detect_encoding(body, None), UTF_8);
    }
}
