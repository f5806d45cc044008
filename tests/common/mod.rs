#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{header, multipart, redirect, Client, Response, StatusCode};
use tempfile::TempDir;
use wanderlust::config::AppConfig;
use wanderlust::database::models::Listing;
use wanderlust::database::{MemoryStore, Store};
use wanderlust::images::LocalImageStore;
use wanderlust::AppState;

pub const PASSWORD: &str = "hunter22";

/// Lowest cost bcrypt accepts; keeps signups fast.
pub const TEST_HASH_COST: u32 = 4;

/// The app served in-process on a free port, backed by the in-memory store.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    pub upload_dir: TempDir,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let upload_dir = tempfile::tempdir()?;

        let mut config = AppConfig::development();
        config.server.port = port;
        config.security.password_hash_cost = TEST_HASH_COST;
        config.storage.upload_dir = upload_dir.path().to_path_buf();

        let store = Arc::new(MemoryStore::new());
        let images = Arc::new(LocalImageStore::new(upload_dir.path()));
        let state = AppState::new(config, store.clone(), images);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        tokio::spawn(async move {
            let service = wanderlust::service(state);
            let _ = axum::serve(listener, axum::ServiceExt::<axum::extract::Request>::into_make_service(service)).await;
        });

        let server = Self { port, base_url, store, upload_dir };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// A browser-like client: keeps cookies, does not follow redirects.
    pub fn client(&self) -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .expect("failed to build client")
    }

    pub async fn signup(&self, client: &Client, username: &str) -> Result<Response> {
        let email = format!("{username}@example.com");
        let form = [("username", username), ("email", email.as_str()), ("password", PASSWORD)];
        Ok(client.post(self.url("/signup")).form(&form).send().await?)
    }

    pub async fn login(&self, client: &Client, username: &str, password: &str) -> Result<Response> {
        let form = [("username", username), ("password", password)];
        Ok(client.post(self.url("/login")).form(&form).send().await?)
    }

    /// Signs up `username` on a fresh client and returns it logged in.
    pub async fn user_client(&self, username: &str) -> Result<Client> {
        let client = self.client();
        let res = self.signup(&client, username).await?;
        anyhow::ensure!(res.status() == StatusCode::SEE_OTHER, "signup failed with {}", res.status());
        Ok(client)
    }

    pub async fn post_listing(&self, client: &Client, path: &str, form: multipart::Form) -> Result<Response> {
        Ok(client.post(self.url(path)).multipart(form).send().await?)
    }

    /// Creates a listing through the form and returns it from the store.
    pub async fn create_listing(&self, client: &Client, title: &str, price: &str) -> Result<Listing> {
        let res = self.post_listing(client, "/listings", listing_form(title, price)).await?;
        anyhow::ensure!(res.status() == StatusCode::SEE_OTHER, "create failed with {}", res.status());

        let listings = self.store.list_listings().await?;
        listings
            .into_iter()
            .find(|listing| listing.title == title)
            .context("created listing not found in store")
    }

    pub async fn get_text(&self, client: &Client, path: &str) -> Result<String> {
        Ok(client.get(self.url(path)).send().await?.text().await?)
    }

    pub async fn review(&self, client: &Client, listing: &Listing, comment: &str, rating: &str) -> Result<Response> {
        let form = [("review[comment]", comment), ("review[rating]", rating)];
        Ok(client
            .post(self.url(&format!("/listings/{}/reviews", listing.id)))
            .form(&form)
            .send()
            .await?)
    }
}

pub fn listing_form(title: &str, price: &str) -> multipart::Form {
    multipart::Form::new()
        .text("listing[title]", title.to_string())
        .text("listing[description]", "A quiet place near the water")
        .text("listing[price]", price.to_string())
        .text("listing[location]", "Lisbon")
        .text("listing[country]", "Portugal")
}

pub fn location(res: &Response) -> String {
    res.headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
