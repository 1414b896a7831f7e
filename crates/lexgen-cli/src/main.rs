//! lexgen command-line front end

mod cli;

use anyhow::Context;
use cli::{Action, Invocation};
use lexgen_core::{LexgenConfig, LexiconService, PipelineError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let matches = cli::command().get_matches();
    let invocation = match cli::parse(&matches) {
        Ok(invocation) => invocation,
        Err(e) => return report_error(&e),
    };

    init_tracing(invocation.log_json);

    let config = LexgenConfig::load(invocation.config.as_deref())
        .context("failed to load configuration")?;

    if invocation.action == Action::Profiles {
        let table = config.profile_table().context("invalid profile overrides")?;
        let rows: BTreeMap<&str, _> =
            table.iter().map(|(flavor, row)| (flavor.key(), row)).collect();
        print_json(&rows)?;
        return Ok(ExitCode::SUCCESS);
    }

    let service = lexgen_clients::http_service(&config).context("failed to wire collaborators")?;
    run(&service, invocation).await
}

async fn run(service: &LexiconService, invocation: Invocation) -> anyhow::Result<ExitCode> {
    let outcome = match invocation.action {
        Action::Word { letter, enriched } => match cli::single_letter(&letter) {
            Ok(letter) if enriched => service.generate_enriched_word(letter).await.map(to_json),
            Ok(letter) => service.generate_word(letter).await.map(to_json),
            Err(e) => Err(e),
        },
        Action::Question { tier } => service.generate_question(tier).await.map(to_json),
        Action::Topic { topic } => service.generate_topic_word(&topic).await.map(to_json),
        Action::Validate { word } => service.validate_word(&word).await.map(to_json),
        Action::Translate { word } => service.translate_word(&word).await.map(to_json),
        Action::Profiles => return Ok(ExitCode::SUCCESS),
    };

    match outcome {
        Ok(value) => {
            print_json(&value?)?;
            tracing::debug!(stats = ?service.stats(), "done");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => report_error(&e),
    }
}

fn to_json<T: Serialize>(value: T) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(value)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report_error(error: &PipelineError) -> anyhow::Result<ExitCode> {
    tracing::error!(%error, "request failed");
    print_json(&ErrorBody {
        error: error.category(),
    })?;
    Ok(ExitCode::FAILURE)
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries the JSON payload.
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
