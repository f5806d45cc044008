//! HTML rendering. Every page is a plain function from data to markup,
//! wrapped in the shared [`layout`].

pub mod error;
pub mod listings;
pub mod users;

use axum::response::Html;

use crate::middleware::{CurrentUser, Notice, NoticeKind};

/// Per-page context: who is logged in and the notices to show once.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub user: Option<CurrentUser>,
    pub notices: Vec<Notice>,
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn navbar(user: Option<&CurrentUser>) -> String {
    let account = match user {
        Some(user) => format!(
            r#"<span class="nav-user">Signed in as {}</span><a class="nav-link" href="/logout">Log out</a>"#,
            escape(&user.username)
        ),
        None => r#"<a class="nav-link" href="/signup">Sign up</a><a class="nav-link" href="/login">Log in</a>"#
            .to_string(),
    };

    format!(
        r#"<nav class="navbar">
  <a class="brand" href="/listings">Wanderlust</a>
  <a class="nav-link" href="/listings">Explore</a>
  <a class="nav-link" href="/listing/new">Airbnb your home</a>
  <div class="nav-account">{account}</div>
</nav>"#
    )
}

fn notices(notices: &[Notice]) -> String {
    notices
        .iter()
        .map(|notice| {
            let class = match notice.kind {
                NoticeKind::Success => "alert alert-success",
                NoticeKind::Error => "alert alert-danger",
            };
            format!(r#"<div class="{class}" role="alert">{}</div>"#, escape(&notice.message))
        })
        .collect()
}

pub fn layout(page: &Page, title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title} | Wanderlust</title>
  <link rel="stylesheet" href="/static/css/style.css">
</head>
<body>
{navbar}
<main class="container">
{notices}
{body}
</main>
<footer class="footer">&copy; Wanderlust Private Limited</footer>
</body>
</html>"#,
        title = escape(title),
        navbar = navbar(page.user.as_ref()),
        notices = notices(&page.notices),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn layout_renders_notices_once_each() {
        let page = Page {
            user: None,
            notices: vec![
                Notice { kind: NoticeKind::Success, message: "Saved".to_string() },
                Notice { kind: NoticeKind::Error, message: "<b>bad</b>".to_string() },
            ],
        };
        let Html(html) = layout(&page, "Test", "<p>body</p>");
        assert_eq!(html.matches("alert-success").count(), 1);
        assert!(html.contains("&lt;b&gt;bad&lt;/b&gt;"));
        assert!(html.contains(r#"href="/login""#));
    }
}
