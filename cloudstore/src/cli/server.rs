pub async fn run() -> i32 {
    match server::run().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("server error: {e:#}");
            1
        }
    }
}
