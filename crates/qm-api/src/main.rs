#[tokio::main]
async fn main() -> Result<(), qm_api::error::ApiError> {
    qm_api::run().await
}
