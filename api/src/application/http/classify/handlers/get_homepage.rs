use axum::{extract::State, response::Html};

use crate::application::http::server::app_state::AppState;

const HOMEPAGE: &str = r#"<!doctype html>
<html>
  <head><meta charset="utf-8"><title>Food Classifier</title></head>
  <body>
    <h1>Food Image Classifier</h1>
    <form action="{root}/classify" enctype="multipart/form-data" method="post">
      <input name="image" type="file" accept="image/*" required />
      <label for="mode">Mode:</label>
      <select name="mode" id="mode">
        <option value="chat">Chat API (default)</option>
        <option value="chat_reasoned">Chat API, two-pass</option>
        <option value="local">Local model (fallback)</option>
      </select>
      <label for="lang">Language:</label>
      <select name="lang" id="lang">
        <option value="en">English</option>
        <option value="ko">Korean</option>
      </select>
      <button type="submit">Classify</button>
    </form>
  </body>
</html>
"#;

#[utoipa::path(
    get,
    path = "/",
    tag = "classify",
    summary = "Upload form",
    responses(
        (status = 200, description = "Minimal HTML upload form", content_type = "text/html")
    ),
)]
pub async fn get_homepage(State(state): State<AppState>) -> Html<String> {
    Html(HOMEPAGE.replace("{root}", &state.args.server.root_path))
}
