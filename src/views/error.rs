use axum::http::StatusCode;
use axum::response::Html;

use super::{escape, layout, Page};

pub fn error_page(status: StatusCode, message: &str) -> Html<String> {
    let body = format!(
        r#"<div class="error">
  <h2>{code}</h2>
  <p class="alert alert-danger">{message}</p>
  <a href="/listings">Back to listings</a>
</div>"#,
        code = status.as_u16(),
        message = escape(message),
    );
    layout(&Page::default(), "Error", &body)
}
