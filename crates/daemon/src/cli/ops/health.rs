use clap::Args;

use custody_daemon::state::AppState;

#[derive(Args, Debug, Clone)]
pub struct Health;

#[async_trait::async_trait]
impl crate::cli::op::Op for Health {
    type Error = std::convert::Infallible;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut lines = Vec::new();

        // 1. Check config directory
        lines.push("Config:".to_string());
        match AppState::load(ctx.config_path.clone()) {
            Ok(state) => {
                lines.push(format!("  directory:    {}", state.custody_dir.display()));
                lines.push("  config.toml:  OK".to_string());
                lines.push("  db.sqlite:    OK".to_string());
                match state.load_key() {
                    Ok(key) => lines.push(format!("  key.pem:      OK ({})", key.public())),
                    Err(e) => lines.push(format!("  key.pem:      {}", e)),
                }
                lines.push(format!("  api_port:     {}", state.config.api_port));
                lines.push(format!(
                    "  custodians:   {} (threshold {})",
                    state.config.custodians.len(),
                    state.config.threshold
                ));
            }
            Err(e) => {
                lines.push(format!("  error: {}", e));
            }
        }

        // 2. Probe the daemon's status endpoints
        let base = ctx.client.base_url();
        let client = ctx.client.http_client();

        lines.push(String::new());
        lines.push(format!("Daemon ({}):", base));

        for probe in ["livez", "readyz"] {
            let url = format!(
                "{}/_status/{}",
                base.as_str().trim_end_matches('/'),
                probe
            );
            let status = match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => "OK".to_string(),
                Ok(resp) => format!("UNHEALTHY ({})", resp.status()),
                Err(_) => "NOT REACHABLE".to_string(),
            };
            lines.push(format!("  {:<7} {}", format!("{}:", probe), status));
        }

        Ok(lines.join("\n"))
    }
}
