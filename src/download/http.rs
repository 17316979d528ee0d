use crate::error::{InstallError, InstallResult};
use std::io::Read;
use std::time::Duration;

/// Redirect hops followed before giving up
pub const MAX_REDIRECTS: usize = 10;

const USER_AGENT: &str = concat!("cl-wrangler/", env!("CARGO_PKG_VERSION"));

/// Source of release archives
pub trait Fetch {
    /// Fetch `url` and return the fully buffered body
    fn fetch(&self, url: &str) -> InstallResult<Vec<u8>>;
}

/// Downloads over HTTP(S), following redirects by hand so every hop's
/// status is checked the same way
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new()
            .redirects(0)
            .user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout_connect(timeout).timeout(timeout);
        }
        Self {
            agent: builder.build(),
        }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> InstallResult<Vec<u8>> {
        download_http_bytes(&self.agent, url)
    }
}

fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

/// Download `url` into memory. Only a terminal 200 counts as success.
fn download_http_bytes(agent: &ureq::Agent, url: &str) -> InstallResult<Vec<u8>> {
    let mut current = url.to_string();

    for _ in 0..=MAX_REDIRECTS {
        let response = match agent.get(&current).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                return Err(InstallError::DownloadFailed {
                    status,
                    url: current,
                });
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(InstallError::Network {
                    url: current,
                    source: Box::new(transport),
                });
            }
        };

        let status = response.status();
        if is_redirect(status) {
            let location = response
                .header("location")
                .ok_or_else(|| InstallError::DownloadFailed {
                    status,
                    url: current.clone(),
                })?;
            let next = resolve_location(&current, location)?;
            log::debug!("Redirected ({status}) to {next}");
            current = next;
            continue;
        }

        if status != 200 {
            return Err(InstallError::DownloadFailed {
                status,
                url: current,
            });
        }

        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| InstallError::Network {
                url: current.clone(),
                source: Box::new(e),
            })?;

        log::debug!("Downloaded {} bytes from {current}", body.len());
        return Ok(body);
    }

    Err(InstallError::TooManyRedirects {
        url: url.to_string(),
    })
}

/// Resolve a `Location` header, which may be relative, against the request URL
fn resolve_location(base: &str, location: &str) -> InstallResult<String> {
    let base = url::Url::parse(base)
        .map_err(|e| InstallError::Config(format!("Invalid download URL {base}: {e}")))?;
    base.join(location)
        .map(String::from)
        .map_err(|e| InstallError::Network {
            url: base.to_string(),
            source: Box::new(e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(Some(Duration::from_secs(10)))
    }

    #[test]
    fn test_fetch_ok() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/v1.2.3/cl_linux_amd64.tar.gz")
            .with_status(200)
            .with_body(b"archive-bytes")
            .create();

        let url = format!("{}/v1.2.3/cl_linux_amd64.tar.gz", server.url());
        let body = fetcher().fetch(&url).unwrap();

        assert_eq!(body, b"archive-bytes");
        mock.assert();
    }

    #[test]
    fn test_fetch_follows_redirects() {
        let mut server = Server::new();
        let first = server
            .mock("GET", "/download")
            .with_status(302)
            .with_header("location", &format!("{}/moved", server.url()))
            .create();
        let second = server
            .mock("GET", "/moved")
            .with_status(301)
            .with_header("location", "/final/cl.tar.gz")
            .create();
        let last = server
            .mock("GET", "/final/cl.tar.gz")
            .with_status(200)
            .with_body("payload")
            .create();

        let body = fetcher()
            .fetch(&format!("{}/download", server.url()))
            .unwrap();

        assert_eq!(body, b"payload");
        first.assert();
        second.assert();
        last.assert();
    }

    #[test]
    fn test_fetch_404_is_download_failed() {
        let mut server = Server::new();
        let mock = server.mock("GET", "/missing.tar.gz").with_status(404).create();

        let url = format!("{}/missing.tar.gz", server.url());
        match fetcher().fetch(&url) {
            Err(InstallError::DownloadFailed { status, url: failed }) => {
                assert_eq!(status, 404);
                assert_eq!(failed, url);
            }
            other => panic!("expected DownloadFailed, got {other:?}"),
        }
        mock.assert();
    }

    #[test]
    fn test_fetch_non_200_success_is_rejected() {
        let mut server = Server::new();
        server.mock("GET", "/partial").with_status(204).create();

        let result = fetcher().fetch(&format!("{}/partial", server.url()));
        assert!(matches!(
            result,
            Err(InstallError::DownloadFailed { status: 204, .. })
        ));
    }

    #[test]
    fn test_fetch_redirect_without_location() {
        let mut server = Server::new();
        server.mock("GET", "/nowhere").with_status(302).create();

        let result = fetcher().fetch(&format!("{}/nowhere", server.url()));
        assert!(matches!(
            result,
            Err(InstallError::DownloadFailed { status: 302, .. })
        ));
    }

    #[test]
    fn test_fetch_redirect_loop() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/loop")
            .with_status(302)
            .with_header("location", "/loop")
            .expect(MAX_REDIRECTS + 1)
            .create();

        let result = fetcher().fetch(&format!("{}/loop", server.url()));
        assert!(matches!(result, Err(InstallError::TooManyRedirects { .. })));
        mock.assert();
    }

    #[test]
    fn test_fetch_connection_refused_is_network_error() {
        // Port 9 (discard) is not expected to be listening on loopback
        let result = fetcher().fetch("http://127.0.0.1:9/cl.tar.gz");
        assert!(matches!(result, Err(InstallError::Network { .. })));
    }

    #[test]
    fn test_resolve_location() {
        assert_eq!(
            resolve_location("https://github.com/a/b/releases/download/v1/x.zip", "/c/d.zip").unwrap(),
            "https://github.com/c/d.zip"
        );
        assert_eq!(
            resolve_location("https://github.com/a/b", "https://objects.example.com/x").unwrap(),
            "https://objects.example.com/x"
        );
    }
}
