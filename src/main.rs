#[tokio::main]
async fn main() {
    std::process::exit(ytdownloader_lib::run().await)
}
