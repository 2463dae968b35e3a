use std::sync::OnceLock;

use axum::response::Html;
use minijinja::{context, Environment};

use crate::core::error::{AppError, Result};

/// Global template environment, compiled once on first use
static TEMPLATE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

const INDEX_TEMPLATE: &str = include_str!("../../../../templates/index.html");

fn template_env() -> &'static Environment<'static> {
    TEMPLATE_ENV.get_or_init(|| {
        let mut env = Environment::new();
        env.add_template("index.html", INDEX_TEMPLATE)
            .expect("index template is valid");
        env
    })
}

/// Render the slideshow page
pub async fn index() -> Result<Html<String>> {
    let template = template_env()
        .get_template("index.html")
        .map_err(|e| AppError::Internal(format!("Template lookup failed: {}", e)))?;

    let html = template
        .render(context! { title => "Photowall" })
        .map_err(|e| AppError::Internal(format!("Template render failed: {}", e)))?;

    Ok(Html(html))
}

#[cfg(test)]
mod tests {
    use crate::shared::test_helpers::test_app;
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use axum_test::TestServer;

    #[tokio::test]
    async fn test_index_renders_html() {
        let (app, _ctx) = test_app(&["10.0.0.0/8"], &[]);
        let server = TestServer::new(app).unwrap();

        let response = server
            .get("/")
            .add_header(
                HeaderName::from_static("x-forwarded-for"),
                HeaderValue::from_static("10.0.0.5"),
            )
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let content_type = response.header("content-type");
        assert!(content_type.to_str().unwrap().starts_with("text/html"));
        assert!(response.text().contains("<html"));
    }
}
