use reqwest::StatusCode;
use serde::Deserialize;
use std::{env, time::Duration};
use tokio::time::sleep;
use uuid::Uuid;

#[derive(Deserialize)]
struct AccountResponse {
    id: i64,
    email: String,
    roles: Vec<String>,
    website: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    code: Option<String>,
}

#[tokio::test]
async fn smoke_storefront_flow() {
    dotenvy::dotenv().ok();

    // Needs a running storefront-api with Postgres behind it.
    let run_smoke = env::var("RUN_SMOKE_STOREFRONT")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if !run_smoke {
        eprintln!("skipping smoke_storefront_flow (set RUN_SMOKE_STOREFRONT=1 to enable)");
        return;
    }

    let base_url = env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3333".to_string());
    let retries: usize = env::var("SMOKE_RETRIES")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(30);
    let retry_delay_ms: u64 = env::var("SMOKE_RETRY_DELAY_MS")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(300);

    let client = reqwest::Client::new();
    wait_for_health(&client, &base_url, retries, retry_delay_ms).await;

    let email = format!("smoke+{}@example.com", Uuid::new_v4().simple());

    let register = client
        .post(format!("{}/api/v1/auth/register", base_url))
        .json(&serde_json::json!({
            "email": email,
            "password": "Abcdef1!",
            "website": "https://smoke.example",
        }))
        .send()
        .await
        .expect("register request failed");
    assert_eq!(register.status(), StatusCode::CREATED);
    let registered: AccountResponse = register.json().await.expect("register json");
    assert_eq!(registered.email, email);
    assert_eq!(registered.roles, vec!["ROLE_USER".to_string()]);
    assert_eq!(registered.website.as_deref(), Some("https://smoke.example"));

    let register_again = client
        .post(format!("{}/api/v1/auth/register", base_url))
        .json(&serde_json::json!({
            "email": email,
            "password": "Other1!x",
        }))
        .send()
        .await
        .expect("second register request failed");
    assert_eq!(register_again.status(), StatusCode::OK);
    let existing: AccountResponse = register_again.json().await.expect("register json");
    assert_eq!(existing.id, registered.id);

    let bad_login = client
        .post(format!("{}/api/v1/auth/login", base_url))
        .json(&serde_json::json!({
            "email": email,
            "password": "wrong",
        }))
        .send()
        .await
        .expect("bad login request failed");
    assert_eq!(bad_login.status(), StatusCode::UNAUTHORIZED);
    let bad_login_body: ErrorResponse = bad_login.json().await.expect("login error json");
    assert_eq!(bad_login_body.code.as_deref(), Some("invalid_credentials"));

    let login = client
        .post(format!("{}/api/v1/auth/login", base_url))
        .json(&serde_json::json!({
            "email": email,
            "password": "Abcdef1!",
        }))
        .send()
        .await
        .expect("login request failed");
    assert_eq!(login.status(), StatusCode::OK);
    let sid_cookie = extract_sid_cookie(&login);

    let me = client
        .get(format!("{}/api/v1/me", base_url))
        .header(reqwest::header::COOKIE, sid_cookie.clone())
        .send()
        .await
        .expect("me request failed");
    assert_eq!(me.status(), StatusCode::OK);
    let me_body: AccountResponse = me.json().await.expect("me json");
    assert_eq!(me_body.id, registered.id);

    let patch = client
        .patch(format!("{}/api/v1/me", base_url))
        .header(reqwest::header::COOKIE, sid_cookie.clone())
        .json(&serde_json::json!({ "website": "https://changed.example" }))
        .send()
        .await
        .expect("patch me request failed");
    assert_eq!(patch.status(), StatusCode::OK);
    let patched: AccountResponse = patch.json().await.expect("patch json");
    assert_eq!(patched.website.as_deref(), Some("https://changed.example"));

    let admin_as_user = client
        .get(format!("{}/api/v1/admin/catalog", base_url))
        .header(reqwest::header::COOKIE, sid_cookie.clone())
        .send()
        .await
        .expect("admin request failed");
    assert_eq!(admin_as_user.status(), StatusCode::FORBIDDEN);

    let admin_anonymous = client
        .get(format!("{}/api/v1/admin/catalog", base_url))
        .send()
        .await
        .expect("anonymous admin request failed");
    assert_eq!(admin_anonymous.status(), StatusCode::UNAUTHORIZED);

    for target in [email.clone(), format!("nobody+{}@example.com", Uuid::new_v4().simple())] {
        let reset = client
            .post(format!("{}/api/v1/auth/password-reset", base_url))
            .json(&serde_json::json!({ "email": target }))
            .send()
            .await
            .expect("password reset request failed");
        assert_eq!(reset.status(), StatusCode::ACCEPTED);
    }

    let logout = client
        .post(format!("{}/api/v1/auth/logout", base_url))
        .header(reqwest::header::COOKIE, sid_cookie.clone())
        .send()
        .await
        .expect("logout request failed");
    assert_eq!(logout.status(), StatusCode::NO_CONTENT);

    let me_after = client
        .get(format!("{}/api/v1/me", base_url))
        .header(reqwest::header::COOKIE, sid_cookie)
        .send()
        .await
        .expect("me after logout request failed");
    assert_eq!(me_after.status(), StatusCode::UNAUTHORIZED);
}

async fn wait_for_health(client: &reqwest::Client, base_url: &str, retries: usize, delay_ms: u64) {
    let url = format!("{}/api/v1/health", base_url);
    for attempt in 0..retries {
        match client.get(&url).send().await {
            Ok(response) if response.status() == StatusCode::OK => return,
            _ => {
                if attempt + 1 >= retries {
                    panic!(
                        "service not ready after {} attempts (base_url={})",
                        retries, base_url
                    );
                }
                sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

fn extract_sid_cookie(response: &reqwest::Response) -> String {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| {
            let pair = value.split(';').next()?.trim();
            pair.starts_with("sid=").then(|| pair.to_string())
        })
        .expect("login response must set the sid cookie")
}
