use clap::{Args, Subcommand};

pub mod get;
pub mod set;

use crate::cli::op::Op;
use custody_daemon::http_server::api::v0::secret::{GetRequest, SetRequest};

crate::command_enum! {
    (Set, SetRequest),
    (Get, GetRequest),
}

pub type SecretCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Secret {
    #[command(subcommand)]
    pub command: SecretCommand,
}

#[async_trait::async_trait]
impl Op for Secret {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
