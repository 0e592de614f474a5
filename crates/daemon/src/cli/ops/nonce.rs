use custody_daemon::http_server::api::client::ApiError;
use custody_daemon::http_server::api::v0::nonce::{NonceRequest, NonceResponse};

#[async_trait::async_trait]
impl crate::cli::op::Op for NonceRequest {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response: NonceResponse = client.call(self.clone()).await?;
        Ok(response.nonce)
    }
}
