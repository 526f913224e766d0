use axum::{response::Html, Json};
use serde_json::{json, Value};

/// GET /health
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "ok": true,
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /
/// Minimal manual-testing page for the resume route.
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

const INDEX_PAGE: &str = r#"<!doctype html>
<html>
  <head><title>LockedIn API</title></head>
  <body>
    <h1>LockedIn API</h1>
    <p>Try <a href="/health">/health</a> or POST <code>/api/ai/summarize-resume</code>.</p>
    <form action="/api/ai/summarize-resume" method="post" enctype="multipart/form-data">
      <input type="file" name="file" accept="application/pdf,image/png,image/jpeg" />
      <button type="submit">Upload resume (PDF / PNG / JPG)</button>
    </form>
  </body>
</html>
"#;
