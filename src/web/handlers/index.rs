//! Informational status page served at `/`.

use axum::response::Html;

const STATUS_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>mailpix</title>
  <style>
    body { font-family: monospace; max-width: 40em; margin: 3em auto; color: #222; }
    code { background: #f0f0f0; padding: 0 0.3em; }
  </style>
</head>
<body>
  <h1>mailpix</h1>
  <p>Tracking-pixel server is running.</p>
  <ul>
    <li><code>GET /track/{trackingId}.png</code> &mdash; the pixel</li>
    <li><code>GET /api/recent-opens?since=&lt;ISO8601&gt;</code> &mdash; recent opens</li>
    <li><code>GET /api/tracking/{trackingId}</code> &mdash; one record</li>
    <li><code>GET /api/all-tracking</code> &mdash; latest opened records</li>
    <li><code>GET /health</code> &mdash; health check</li>
  </ul>
</body>
</html>
"#;

pub async fn index_handler() -> Html<&'static str> {
    Html(STATUS_PAGE)
}
