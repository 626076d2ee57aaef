use std::fmt::Write as _;

use anyhow::Result;
use common::address::Address;
use common::rpc::Connector;
use common::types::{ActivitySeries, WalletPersona};

use crate::endpoint_pool::EndpointStatus;
use crate::insights::health_band;
use crate::service::PersonaService;

const USAGE: &str = "usage: evaluator <persona|activity|risk|report> <address> | evaluator endpoints";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Persona { address: String },
    Activity { address: String },
    Risk { address: String },
    Report { address: String },
    Endpoints,
}

pub fn parse_args<I>(mut args: I) -> std::result::Result<Command, String>
where
    I: Iterator<Item = String>,
{
    // Drop argv[0].
    let _ = args.next();

    let Some(cmd) = args.next() else {
        return Err(USAGE.to_string());
    };

    let mut address = || {
        args.next()
            .ok_or_else(|| format!("usage: evaluator {cmd} <address>"))
    };

    match cmd.as_str() {
        "persona" => Ok(Command::Persona { address: address()? }),
        "activity" => Ok(Command::Activity { address: address()? }),
        "risk" => Ok(Command::Risk { address: address()? }),
        "report" => Ok(Command::Report { address: address()? }),
        "endpoints" => Ok(Command::Endpoints),
        other => Err(format!("unknown command: {other}\n{USAGE}")),
    }
}

/// Runs `cmd` and returns what should be printed to stdout.
pub async fn run_command<C: Connector>(svc: &PersonaService<C>, cmd: Command) -> Result<String> {
    Ok(match cmd {
        Command::Persona { address } => render_persona(&svc.persona(&address).await?),
        Command::Activity { address } => render_activity(&svc.activity(&address).await?),
        Command::Risk { address } => {
            let address = Address::parse(&address)?;
            render_risk(&address, svc.risk_score(address.as_str()).await?)
        }
        Command::Report { address } => serde_json::to_string_pretty(&svc.report(&address).await?)?,
        Command::Endpoints => render_endpoints(&svc.probe_endpoints().await),
    })
}

pub fn render_persona(p: &WalletPersona) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}  (primary: {})", p.title.as_str(), p.primary_trait.as_str());
    let _ = writeln!(out, "  {}", p.description);
    let _ = writeln!(out, "  first transaction: {}", p.first_transaction_date);
    for t in &p.traits {
        let _ = writeln!(out, "  {:<12} {:>3}", t.name.as_str(), t.level);
    }
    let _ = write!(
        out,
        "  transactions={}  assets={}  networks={}",
        p.stats.transactions, p.stats.assets, p.stats.networks
    );
    out
}

pub fn render_activity(series: &ActivitySeries) -> String {
    series
        .labels
        .iter()
        .zip(series.values)
        .map(|(label, v)| format!("{label:<4} {v:>6}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_risk(address: &Address, score: u8) -> String {
    format!(
        "{}  risk score: {score}  ({})",
        address.truncated(),
        health_band(score).as_str()
    )
}

pub fn render_endpoints(statuses: &[EndpointStatus]) -> String {
    statuses
        .iter()
        .map(|s| match &s.latest_block {
            Ok(h) => format!("ok    block={h:<10} {}", s.endpoint),
            Err(e) => format!("down  {e}"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
