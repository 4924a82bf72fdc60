use nuclear_dispatch::hyper_service::serve;
use nuclear_dispatch::{controller, Controller, Failure, Kind, Router, RouterConfig, StatusCode};

use serde_json::json;
use tokio::net::TcpListener;

fn api() -> Controller {
    controller! { "api";
        GET "/hello/:name" => |ctx| Box::pin(async move {
            let greeting = format!("hello, {}!", ctx.param("name").unwrap_or("nobody"));
            ctx.send_text(greeting, StatusCode::OK);
            Ok(())
        }),
        GET "/api/v1/file/*" => |ctx| Box::pin(async move {
            let path = ctx.tail().unwrap_or("").to_owned();
            if path.contains("..") {
                return Err(Failure::new(Kind::Forbidden).with_message("path escapes root"));
            }
            ctx.send_text(format!("access file: {}", path), StatusCode::OK);
            Ok(())
        }),
        POST "/api/v1/sum" => |ctx| Box::pin(async move {
            let nums: Vec<i64> = match ctx.body_json() {
                Ok(nums) => nums,
                Err(e) => return Err(Failure::new(Kind::InvalidArgument).with_cause(e)),
            };
            ctx.send_json(&json!({ "sum": nums.iter().sum::<i64>() }), StatusCode::OK);
            Ok(())
        }),
        FAIL "/api/*" [Kind::InvalidArgument] => |ctx| Box::pin(async move {
            let detail = ctx.failure().map(|f| f.to_string());
            ctx.send_json(&json!({ "success": false, "error": detail }), StatusCode::BAD_REQUEST);
            Ok(())
        }),
        FAIL "/*" => |ctx| Box::pin(async move {
            let status = ctx.failure_status();
            ctx.send_json(&json!({ "success": false }), status);
            Ok(())
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => RouterConfig::load(path)?,
        None => RouterConfig::default(),
    };
    let router = Router::configure_with(config, [api()])?;

    let addr = "127.0.0.1:3000";
    let listener = TcpListener::bind(addr).await?;

    println!("Server is listening on: http://{}", addr);
    println!("hello: http://{}/hello/world", addr);
    println!("api: http://{}/api/v1/file/path/to/public/file", addr);
    println!("sum: curl -d '[1,2,3]' http://{}/api/v1/sum", addr);
    println!("404: http://{}/other/path", addr);
    println!();

    serve(router, listener).await?;
    Ok(())
}
