use mock_server::MockApi;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    let api = MockApi::default();
    let config = api.config();
    println!(
        "listening on http://{addr}/v1/ (token {}, user {} / {})",
        config.api_token, config.username, config.password
    );
    mock_server::run(listener, api).await
}
