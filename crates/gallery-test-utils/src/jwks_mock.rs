//! Mocked identity provider JWKS endpoint.

use crate::crypto_fixtures::RsaFixture;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mocked identity provider serves its key set on.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Full JWKS URL for a mock server.
pub fn jwks_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), JWKS_PATH)
}

/// Start a mock server publishing `fixture`'s key.
pub async fn start_jwks_server(fixture: &RsaFixture) -> MockServer {
    let server = MockServer::start().await;
    mount_jwks(&server, fixture, None).await;
    server
}

/// Mount a JWKS response for `fixture`.
///
/// With `expected_calls` set, the mock server verifies on drop that the
/// endpoint was hit exactly that many times.
pub async fn mount_jwks(server: &MockServer, fixture: &RsaFixture, expected_calls: Option<u64>) {
    let mock = Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture.jwks_json()));

    match expected_calls {
        Some(n) => mock.expect(n).mount(server).await,
        None => mock.mount(server).await,
    }
}

/// Mount a JWKS endpoint that fails with `status` for the next `times` calls.
pub async fn mount_jwks_failure(server: &MockServer, status: u16, times: u64) {
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(status))
        .up_to_n_times(times)
        .expect(times)
        .mount(server)
        .await;
}
