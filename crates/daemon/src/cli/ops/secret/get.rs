use custody_daemon::http_server::api::client::ApiError;
use custody_daemon::http_server::api::v0::secret::{GetRequest, GetResponse};

#[async_trait::async_trait]
impl crate::cli::op::Op for GetRequest {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response: GetResponse = client.call(self.clone()).await?;
        Ok(response.recovered)
    }
}
