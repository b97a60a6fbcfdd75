//! Status Command
//!
//! Which providers are configured and which capabilities are available.
//! With `--check`, also pings each configured provider.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::cli::ui::{ConsoleView, Output};
use crate::cli::util::CommandContext;
use crate::services::Capabilities;
use crate::types::Result;

#[derive(Serialize)]
struct StatusReport {
    #[serde(flatten)]
    capabilities: Capabilities,
    #[serde(skip_serializing_if = "Option::is_none")]
    health: Option<BTreeMap<&'static str, bool>>,
}

impl ConsoleView for StatusReport {
    fn render(&self, out: &Output) {
        self.capabilities.render(out);
        if let Some(health) = &self.health {
            out.section("Health");
            for (slot, healthy) in health {
                if *healthy {
                    out.success(&format!("{} provider reachable", slot));
                } else {
                    out.error(&format!("{} provider unreachable", slot));
                }
            }
        }
    }
}

pub async fn run(ctx: &CommandContext, check: bool) -> Result<()> {
    let health = if check {
        Some(ctx.services.health_check().await.into_iter().collect())
    } else {
        None
    };
    let report = StatusReport {
        capabilities: ctx.services.capabilities(),
        health,
    };
    Output::new().emit(&report, ctx.format)
}
