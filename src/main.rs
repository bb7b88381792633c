//! mailpix: tracking-pixel server binary.

#[tokio::main]
async fn main() {
    mailpix::web::run().await;
}
