//! Command-line client for the random-names server.
//!
//! Sends one request and prints the acknowledgement and the reply.

use clap::Parser;
use random_names::FramedChannel;
use serde_json::json;
use tokio::net::TcpStream;

#[derive(Parser, Debug)]
#[command(name = "name-client")]
#[command(version)]
#[command(about = "Ask a random-names server for ten names", long_about = None)]
struct Args {
    /// Server address
    #[arg(short = 's', long, default_value = "127.0.0.1:7567")]
    server: String,

    /// Gender: girl, boy, f, m, female or male
    #[arg(short, long)]
    gender: String,

    /// First letter of the names
    #[arg(short, long)]
    letter: String,

    /// Width of the length header, must match the server
    #[arg(long, default_value_t = 64)]
    header_width: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let stream = TcpStream::connect(&args.server).await?;
    let mut channel = FramedChannel::with_limits(stream, args.header_width, 1024 * 1024);

    let request = json!({ "gender": args.gender, "letter": args.letter });
    channel.send_message(request.to_string().as_bytes()).await?;

    while let Some(message) = channel.receive_message().await? {
        let text = String::from_utf8_lossy(&message);
        match serde_json::from_slice::<serde_json::Value>(&message) {
            Ok(value) if value.is_array() => println!("{}", serde_json::to_string_pretty(&value)?),
            _ => println!("{text}"),
        }
    }

    Ok(())
}
