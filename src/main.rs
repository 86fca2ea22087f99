#[tokio::main]
async fn main() {
    coursim::run().await.expect("error while running coursim server");
}
