//! E2E tests for Discord OAuth and session endpoints

mod common;

use common::{STUB_USER_ID, TestServer, no_redirect_client};

#[tokio::test]
async fn test_login_redirects_to_discord_with_state_cookie() {
    let server = TestServer::new().await;
    let client = no_redirect_client();

    let response = client
        .get(server.url("/login/"))
        .send()
        .await
        .expect("request succeeds");

    assert!(response.status().is_redirection());
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    assert!(location.starts_with("https://discord.com/oauth2/authorize?"));
    assert!(location.contains("client_id=test-client-id"));
    assert!(location.contains("scope=identify"));
    assert!(location.contains("response_type=code"));
    assert!(location.contains("state="));

    let set_cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .expect("set-cookie header");
    assert!(set_cookie.contains("oauth_state="));
}

#[tokio::test]
async fn test_me_without_session_redirects_to_login() {
    let server = TestServer::new().await;
    let client = no_redirect_client();

    let response = client
        .get(server.url("/me/"))
        .send()
        .await
        .expect("request succeeds");

    assert!(response.status().is_redirection());
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    assert_eq!(location, "/login/");

    // No profile data leaks on the redirect
    let body = response.text().await.expect("response body");
    assert!(!body.contains(STUB_USER_ID));
}

#[tokio::test]
async fn test_me_with_forged_session_redirects_to_login() {
    let server = TestServer::new().await;
    let client = no_redirect_client();

    let response = client
        .get(server.url("/me/"))
        .header("Cookie", "session=forged.token")
        .send()
        .await
        .expect("request succeeds");

    assert!(response.status().is_redirection());
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    assert_eq!(location, "/login/");
}

#[tokio::test]
async fn test_callback_without_state_cookie_redirects_to_login() {
    let server = TestServer::new().await;
    let client = no_redirect_client();

    let response = client
        .get(server.url("/callback/?code=dummy&state=dummy"))
        .send()
        .await
        .expect("request succeeds");

    assert!(response.status().is_redirection());
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    assert_eq!(location, "/login/");
}

#[tokio::test]
async fn test_callback_with_mismatched_state_redirects_to_login() {
    let server = TestServer::new().await;
    let client = no_redirect_client();

    let response = client
        .get(server.url("/callback/?code=dummy&state=from-query"))
        .header("Cookie", "oauth_state=from-cookie")
        .send()
        .await
        .expect("request succeeds");

    assert!(response.status().is_redirection());
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    assert_eq!(location, "/login/");
}

#[tokio::test]
async fn test_full_oauth_flow_against_stub_provider() {
    let server = TestServer::with_identity_stub().await;
    let client = no_redirect_client();

    // 1. /login/ hands out the CSRF state in both the redirect and a cookie
    let login = client
        .get(server.url("/login/"))
        .send()
        .await
        .expect("login succeeds");
    assert!(login.status().is_redirection());

    let location = login
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header")
        .to_string();
    let state = location
        .split("state=")
        .nth(1)
        .map(|rest| rest.split('&').next().unwrap_or(rest))
        .expect("state parameter")
        .to_string();

    // 2. The provider redirects back; callback exchanges the code and
    //    establishes a session
    let callback = client
        .get(server.url(&format!("/callback/?code=test-code&state={state}")))
        .header("Cookie", format!("oauth_state={state}"))
        .send()
        .await
        .expect("callback succeeds");

    assert!(callback.status().is_redirection());
    let callback_location = callback
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    assert_eq!(callback_location, "/me/");

    let session_cookie = callback
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
        .expect("session cookie set")
        .split(';')
        .next()
        .unwrap()
        .to_string();

    // 3. /me/ now renders the profile fetched from the provider
    let me = client
        .get(server.url("/me/"))
        .header("Cookie", session_cookie)
        .send()
        .await
        .expect("profile fetch succeeds");

    assert_eq!(me.status(), 200);
    let body = me.text().await.expect("response body");
    assert!(body.contains("Test User"));
    assert!(body.contains(STUB_USER_ID));
    assert!(body.contains("cdn.discordapp.com"));
}

#[tokio::test]
async fn test_me_with_valid_session_cookie_succeeds() {
    let server = TestServer::with_identity_stub().await;
    let client = no_redirect_client();

    let response = client
        .get(server.url("/me/"))
        .header("Cookie", server.create_session_cookie())
        .send()
        .await
        .expect("request succeeds");

    assert_eq!(response.status(), 200);
    let body = response.text().await.expect("response body");
    assert!(body.contains("Test User"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .expect("request succeeds");

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.expect("response body"), "OK");
}
