use cogbots::bot::{self, Variant};

#[tokio::main]
async fn main() {
    bot::run(Variant::Music).await;
}
