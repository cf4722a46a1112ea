use std::rc::Rc;

use beacon::config::Config;
use beacon::handler::RequestHandler;
use beacon::http::request::Request;
use beacon::http::response::Response;
use beacon::server::Server;

struct Greeting;

impl RequestHandler for Greeting {
    fn handle(&self, _request: &Request) -> Response {
        let mut response = Response::ok("Hello from beacon\n");
        response.add_header("Content-Type", "text/plain");
        response
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load();

    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let mut server = Server::bind(&cfg, Rc::new(Greeting)).await?;

            tokio::select! {
                _ = server.run() => {}

                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received");
                }
            }

            server.shutdown().await;
            Ok(())
        })
        .await
}
