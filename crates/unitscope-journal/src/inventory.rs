//! Unit inventory: listing, starting and stopping systemd units

use futures::future::BoxFuture;
use serde::Deserialize;
use tokio::process::Command;

use crate::SourceError;
use unitscope_types::UnitInfo;

/// Access to the live set of systemd units.
///
/// Every call is a single blocking request with no concurrency of its own.
pub trait UnitInventory: Send + Sync {
    fn list_units(&self) -> BoxFuture<'_, Result<Vec<UnitInfo>, SourceError>>;

    fn start_unit<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<(), SourceError>>;

    fn stop_unit<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<(), SourceError>>;
}

/// One row of `systemctl list-units --output=json`
#[derive(Debug, Deserialize)]
struct ListedUnit {
    unit: String,
    #[serde(default)]
    load: String,
    #[serde(default)]
    active: String,
    #[serde(default)]
    sub: String,
    #[serde(default)]
    description: String,
}

impl From<ListedUnit> for UnitInfo {
    fn from(u: ListedUnit) -> Self {
        UnitInfo::new(u.unit, u.description).with_states(u.load, u.active, u.sub)
    }
}

/// systemctl-backed inventory
#[derive(Clone, Debug)]
pub struct SystemCtl {
    program: String,
}

impl SystemCtl {
    pub fn new() -> Self {
        Self {
            program: "systemctl".to_string(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<Vec<u8>, SourceError> {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|source| SourceError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(output.stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.is_empty() {
            Err(SourceError::Command(format!(
                "{} {} failed with {}",
                self.program,
                args.join(" "),
                output.status
            )))
        } else {
            Err(SourceError::Command(stderr))
        }
    }

    async fn unit_command(&self, verb: &str, name: &str) -> Result<(), SourceError> {
        tracing::info!(verb, unit = name, "running unit command");
        self.run(&[verb, name]).await.map(|_| ())
    }
}

impl Default for SystemCtl {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitInventory for SystemCtl {
    fn list_units(&self) -> BoxFuture<'_, Result<Vec<UnitInfo>, SourceError>> {
        Box::pin(async move {
            let stdout = self
                .run(&[
                    "list-units",
                    "--type=service",
                    "--all",
                    "--output=json",
                    "--no-pager",
                ])
                .await?;
            parse_unit_list(&stdout)
        })
    }

    fn start_unit<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<(), SourceError>> {
        Box::pin(self.unit_command("start", name))
    }

    fn stop_unit<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<(), SourceError>> {
        Box::pin(self.unit_command("stop", name))
    }
}

fn parse_unit_list(json: &[u8]) -> Result<Vec<UnitInfo>, SourceError> {
    let listed: Vec<ListedUnit> = serde_json::from_slice(json)?;
    Ok(listed.into_iter().map(UnitInfo::from).collect())
}
