use axum::response::Html;

use super::{layout, Page};

pub fn signup(page: &Page) -> Html<String> {
    layout(
        page,
        "Sign up",
        r#"<h1>Sign up on Wanderlust</h1>
<form method="POST" action="/signup" class="form">
  <label for="username">Username</label>
  <input id="username" name="username" type="text" required>
  <label for="email">Email</label>
  <input id="email" name="email" type="email" required>
  <label for="password">Password</label>
  <input id="password" name="password" type="password" required>
  <button type="submit">Sign up</button>
</form>"#,
    )
}

pub fn login(page: &Page) -> Html<String> {
    layout(
        page,
        "Log in",
        r#"<h1>Log in</h1>
<form method="POST" action="/login" class="form">
  <label for="username">Username</label>
  <input id="username" name="username" type="text" required>
  <label for="password">Password</label>
  <input id="password" name="password" type="password" required>
  <button type="submit">Log in</button>
</form>"#,
    )
}
