/// Debug tool for a running livemark server
///
/// Drives the HTTP and WebSocket API the way a presenter or viewer would.
use clap::{Parser, Subcommand};
use futures::{SinkExt, StreamExt};
use livemark::webserver::models::responses::{
    CreateTopicResponse, ErrorResponse, TopicContentResponse, UpdateResponse,
};
use std::error::Error;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

#[derive(Parser)]
#[command(name = "debug_topic")]
#[command(about = "Debug tool for livemark topics", long_about = None)]
struct Args {
    /// Server base URL
    #[arg(short, long, default_value = "http://127.0.0.1:8000")]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a topic and print its id and secret
    Create,

    /// Fetch a topic's current document
    Get { topic_id: String },

    /// Replace a topic's document over HTTP
    Publish {
        topic_id: String,
        #[arg(long)]
        secret: String,
        /// Markdown text; prefix with @ to read a file
        markdown: String,
    },

    /// Stream every frame a viewer would receive
    Watch {
        topic_id: String,
        /// Connect as publisher
        #[arg(long)]
        secret: Option<String>,
        /// Stop after this many frames
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Send one reaction over a WebSocket
    React {
        topic_id: String,
        #[arg(default_value = "👍")]
        emoji: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let base = Url::parse(&args.server)?;
    let client = reqwest::Client::new();

    println!("livemark Topic Debug Tool\n");
    println!("{}", "=".repeat(80));

    match args.command {
        Command::Create => {
            let response = client.post(base.join("/topics")?).send().await?;
            let created: CreateTopicResponse = response.json().await?;
            println!("Topic ID:  {}", created.topic_id);
            println!("Secret:    {}", created.secret);
            println!("Sub path:  {}", created.sub_path);
            println!("Pub path:  {}", created.pub_path);
        }

        Command::Get { topic_id } => {
            let response = client
                .get(base.join(&format!("/topics/{}", topic_id))?)
                .send()
                .await?;
            let status = response.status();
            if status.is_success() {
                let topic: TopicContentResponse = response.json().await?;
                println!("Created:  {}", topic.created_at);
                println!("Updated:  {}", topic.updated_at);
                println!("Size:     {} bytes", topic.markdown.len());
                println!("{}", "-".repeat(80));
                println!("{}", topic.markdown);
            } else {
                print_error(status, response).await;
            }
        }

        Command::Publish {
            topic_id,
            secret,
            markdown,
        } => {
            let markdown = match markdown.strip_prefix('@') {
                Some(path) => std::fs::read_to_string(path)?,
                None => markdown,
            };

            let mut url = base.join(&format!("/topics/{}", topic_id))?;
            url.query_pairs_mut().append_pair("secret", &secret);

            let response = client
                .post(url)
                .json(&serde_json::json!({ "markdown": markdown }))
                .send()
                .await?;
            let status = response.status();
            if status.is_success() {
                let update: UpdateResponse = response.json().await?;
                println!("Published {} bytes (updatedAt={})", markdown.len(), update.updated_at);
            } else {
                print_error(status, response).await;
            }
        }

        Command::Watch {
            topic_id,
            secret,
            limit,
        } => {
            let url = ws_url(&base, &topic_id, secret.as_deref())?;
            let (stream, _) = connect_async(url.as_str()).await?;
            let (_tx, mut rx) = stream.split();
            println!("Watching {} (Ctrl+C to stop)\n", topic_id);

            let mut seen = 0usize;
            while let Some(msg) = rx.next().await {
                match msg? {
                    Message::Text(text) => {
                        seen += 1;
                        println!(
                            "[{}] {}",
                            chrono::Local::now().format("%H:%M:%S%.3f"),
                            text
                        );
                        if limit.map(|limit| seen >= limit).unwrap_or(false) {
                            break;
                        }
                    }
                    Message::Close(_) => {
                        println!("Server closed the connection");
                        break;
                    }
                    _ => {}
                }
            }
        }

        Command::React { topic_id, emoji } => {
            let url = ws_url(&base, &topic_id, None)?;
            let (mut stream, _) = connect_async(url.as_str()).await?;
            let frame = serde_json::json!({
                "pub": {
                    "reaction": {
                        "emoji": emoji,
                        "timestamp": chrono::Utc::now().timestamp_millis(),
                    }
                }
            });
            stream.send(Message::Text(frame.to_string())).await?;

            // Our own reaction (or an error) comes back on the same socket
            if let Some(reply) = stream.next().await {
                println!("Reply: {}", reply?);
            }
            stream.close(None).await?;
        }
    }

    println!("\n{}", "=".repeat(80));
    Ok(())
}

/// http(s)://host/topics/<id>?secret=... → ws(s)://...
fn ws_url(base: &Url, topic_id: &str, secret: Option<&str>) -> Result<Url, Box<dyn Error>> {
    let mut url = base.join(&format!("/topics/{}", topic_id))?;
    let scheme = if base.scheme() == "https" { "wss" } else { "ws" };
    url.set_scheme(scheme)
        .map_err(|_| format!("cannot use scheme {} for {}", scheme, base))?;
    if let Some(secret) = secret {
        url.query_pairs_mut().append_pair("secret", secret);
    }
    Ok(url)
}

async fn print_error(status: reqwest::StatusCode, response: reqwest::Response) {
    match response.json::<ErrorResponse>().await {
        Ok(body) => println!(
            "Request failed ({}): {} [{}]",
            status,
            body.error,
            body.code.unwrap_or_default()
        ),
        Err(_) => println!("Request failed ({})", status),
    }
}
