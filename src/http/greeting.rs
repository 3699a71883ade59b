//! Page served when no target is given.

use axum::http::header;
use axum::response::{IntoResponse, Response};

pub const GREETING_HTML: &str = "<html>\n<body>\n<h2>Hola</h2>\n</body>\n</html>\n";

pub fn greeting() -> Response {
    (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        GREETING_HTML,
    )
        .into_response()
}
