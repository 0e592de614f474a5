use custody_daemon::http_server::api::client::ApiError;
use custody_daemon::http_server::api::v0::secret::{SetRequest, SetResponse};

#[async_trait::async_trait]
impl crate::cli::op::Op for SetRequest {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response: SetResponse = client.call(self.clone()).await?;

        let mut lines = vec![format!(
            "Stored '{}' ({} of {} shares needed):",
            response.key,
            response.threshold,
            response.custodians.len()
        )];
        lines.extend(response.custodians.iter().map(|url| format!("  {}", url)));
        Ok(lines.join("\n"))
    }
}
