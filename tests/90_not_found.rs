mod common;

use anyhow::Result;
use common::TestServer;
use reqwest::StatusCode;

#[tokio::test]
async fn unknown_paths_render_the_not_found_page() -> Result<()> {
    let server = TestServer::spawn().await?;
    let client = server.client();

    for path in ["/nonexistent", "/listings/a/b/c", "/api/data/users"] {
        let res = client.get(server.url(path)).send().await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{path}");
        assert!(res.text().await?.contains("Page Not Found"));
    }
    Ok(())
}

#[tokio::test]
async fn unsupported_methods_are_not_found() -> Result<()> {
    let server = TestServer::spawn().await?;
    let client = server.client();

    let res = client.put(server.url("/login")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.post(server.url("/logout")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn health_reports_ok() -> Result<()> {
    let server = TestServer::spawn().await?;

    let body: serde_json::Value = reqwest::get(server.url("/health")).await?.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}
