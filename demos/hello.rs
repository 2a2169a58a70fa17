use std::time::Duration;
use tokio::task;
use tracing_subscriber::EnvFilter;
use typedkit::{
    codec::{json_decoder, json_encoder},
    dispatcher::EndpointCodec,
    middleware,
    net::{Client, ClientConfig, Server, ServerConfig},
    Context, Endpoint,
};

fn hello() -> Endpoint<String, String> {
    Endpoint::new(|_ctx, name: String| async move {
        Ok(format!("Hello, {name}!"))
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut server = Server::new();
    server.add(
        "Hello",
        EndpointCodec::new(
            middleware::wrap(&middleware::traced("Hello"), hello()),
            json_decoder(),
            json_encoder(),
        ),
    );
    task::spawn(server.serve_tcp(ServerConfig::default()));
    tokio::time::sleep(Duration::from_secs_f32(0.01)).await;

    let client = Client::new(ClientConfig::default());
    client.ping(Context::background()).await.unwrap();
    let hello = client.endpoint::<String, String>("Hello", json_encoder(), json_decoder());
    let retval = hello.call(Context::background(), "world".into()).await.unwrap();
    println!("{retval}");
}
