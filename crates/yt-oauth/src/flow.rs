use std::time::Duration;

use axum::{Router, extract::Query, response::Html, routing::get};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::info;

use crate::{AUTH_ENDPOINT, OAUTH_CALLBACK_PORT, OAuthConfig, OAuthError, OAuthToken};

/// How long the local callback server waits for the browser redirect
const AUTHORIZATION_TIMEOUT: Duration = Duration::from_secs(300);

/// Generate PKCE verifier and challenge
pub fn generate_pkce() -> (String, String) {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use rand::Rng;
    use rand::distributions::Alphanumeric;
    use sha2::{Digest, Sha256};

    // 64 characters, inside the 43-128 range RFC 7636 allows
    let verifier: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();

    let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));

    (verifier, challenge)
}

/// Build the consent URL; returns `(url, verifier)`
pub fn generate_auth_url(config: &OAuthConfig) -> (String, String) {
    let (verifier, challenge) = generate_pkce();

    let auth_url = format!(
        "{}?\
        client_id={}&\
        redirect_uri={}&\
        response_type=code&\
        scope={}&\
        code_challenge={}&\
        code_challenge_method=S256&\
        access_type=offline&\
        prompt=consent",
        AUTH_ENDPOINT,
        urlencoding::encode(&config.client_id),
        urlencoding::encode(&config.redirect_uri),
        urlencoding::encode(&config.scope),
        urlencoding::encode(&challenge),
    );

    (auth_url, verifier)
}

/// Exchange authorization code for tokens
pub async fn exchange_code(
    config: &OAuthConfig,
    code: &str,
    verifier: &str,
) -> Result<OAuthToken, OAuthError> {
    info!("exchanging authorization code for tokens");

    let params = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("code", code),
        ("code_verifier", verifier),
        ("grant_type", "authorization_code"),
        ("redirect_uri", config.redirect_uri.as_str()),
    ];
    let response =
        crate::post_token_form(&reqwest::Client::new(), &config.token_endpoint, &params).await?;
    response.into_token(None).ok_or(OAuthError::NoRefreshToken)
}

#[derive(Deserialize)]
struct AuthCallback {
    code: Option<String>,
    error: Option<String>,
}

/// Run the installed-app flow: print the consent URL, wait for the browser
/// redirect on the local callback server, then exchange the code.
pub async fn start_auth_flow(config: &OAuthConfig) -> Result<OAuthToken, OAuthError> {
    let (auth_url, verifier) = generate_auth_url(config);

    eprintln!("\n=================================================");
    eprintln!("OAuth 2.0 Authorization Required");
    eprintln!("=================================================");
    eprintln!("\nPlease visit the following URL to authorize the application:\n");
    eprintln!("{}\n", auth_url);
    eprintln!("Waiting for authorization...");
    eprintln!("=================================================\n");

    let (tx, mut rx) = mpsc::channel::<Result<String, String>>(1);

    let callback_handler = move |Query(params): Query<AuthCallback>| {
        let tx = tx.clone();
        async move {
            match (params.code, params.error) {
                (_, Some(error)) => {
                    let page = format!(
                        "<html><body><h1>Authorization Failed</h1><p>Error: {}</p>\
                        <p>You can close this window.</p></body></html>",
                        error
                    );
                    let _ = tx.send(Err(error)).await;
                    Html(page)
                }
                (Some(code), None) => {
                    let _ = tx.send(Ok(code)).await;
                    Html(
                        "<html><body><h1>Authorization Successful!</h1>\
                        <p>You can close this window and return to the application.</p></body></html>"
                            .to_string(),
                    )
                }
                (None, None) => Html(
                    "<html><body><h1>Authorization Failed</h1><p>No code received</p></body></html>"
                        .to_string(),
                ),
            }
        }
    };

    let app = Router::new().route("/oauth2callback", get(callback_handler));
    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", OAUTH_CALLBACK_PORT))
        .await
        .map_err(OAuthError::Callback)?;
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    let outcome = tokio::time::timeout(AUTHORIZATION_TIMEOUT, rx.recv()).await;
    server.abort();

    let code = match outcome {
        Err(_) => return Err(OAuthError::Timeout(AUTHORIZATION_TIMEOUT.as_secs())),
        Ok(None) => return Err(OAuthError::Denied("callback server stopped".to_string())),
        Ok(Some(Err(error))) => return Err(OAuthError::Denied(error)),
        Ok(Some(Ok(code))) => code,
    };

    let token = exchange_code(config, &code, &verifier).await?;
    info!("obtained OAuth tokens");
    Ok(token)
}
