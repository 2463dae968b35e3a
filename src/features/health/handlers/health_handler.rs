/// Liveness probe. Plain text by contract, never JSON; reaching the handler
/// at all means the process is responsive.
pub async fn online() -> &'static str {
    "Success"
}
