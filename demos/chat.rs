use chatlink::{api, ChatMessage, Config, ConnectionManager, StaticToken};
use tokio::io::{AsyncBufReadExt, BufReader};

fn env(name: &str) -> String {
    std::env::var(name)
        .map_err(|_| {
            println!("No {} env var or invalid", name);
            std::process::exit(1);
        })
        .unwrap()
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let endpoint = env("CHAT_API_ENDPOINT");
    let id_token = env("CHAT_ID_TOKEN");
    let user = env("CHAT_USER");

    let client = api::Client::new(&endpoint, &id_token).unwrap();
    let socket = chatlink::discover_endpoint(&client).await.unwrap();

    let manager = ConnectionManager::websocket(Config::new(socket), StaticToken(id_token));

    manager.on_message(|message: ChatMessage| {
        println!("[{}] {}: {}", message.timestamp, message.sender, message.content);
    });
    manager.on_status_change(|connected: bool| {
        if !connected {
            println!("Reconnecting to chat...");
        }
    });

    if let Err(err) = manager.connect().await {
        println!("Connect failed, will retry: {}", err);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let content = line.trim();
        if content.is_empty() {
            continue;
        }

        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default()
            .to_string();
        if !manager.send(&ChatMessage::new(&user, content, timestamp)) {
            println!("Failed to send message: not connected");
            manager.reconnect();
        }
    }

    manager.disconnect().await;
}
