use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use hiscores_scraping::{
    api::HiscoresClient,
    batch::{assemble, FailurePolicy},
    config::Config,
    persistence::save_batch,
    schema::{AccountType, Username},
};
use log::info;

#[derive(Parser)]
struct Opts {
    /// Players to capture.  Overrides `usernames` of the config file.
    usernames: Vec<Username>,

    /// Defaults to `ignore/hiscores-config.toml` if it exists.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    account_type: Option<AccountType>,
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Save the users that could be captured even if some of them failed.
    #[arg(long)]
    isolate_failures: bool,
    /// Fail on a feed whose length does not match the boss catalog.
    #[arg(long)]
    strict_layout: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let opts = Opts::parse();

    let mut config = match &opts.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    if !opts.usernames.is_empty() {
        config.usernames = opts.usernames;
    }
    if let Some(account_type) = opts.account_type {
        config.account_type = account_type;
    }
    if let Some(output_dir) = opts.output_dir {
        config.output_dir = output_dir;
    }
    if opts.isolate_failures {
        config.failure_policy = FailurePolicy::Isolate;
    }
    config.strict_layout |= opts.strict_layout;

    if config.usernames.is_empty() {
        bail!("No usernames were given, either on the command line or in the config file.");
    }

    let mut client = HiscoresClient::new(config.timeout(), &config.user_agent)?;
    if let Some(base_url) = config.base_url.clone() {
        client = client.with_base_url(base_url);
    }

    info!(
        "Capturing {} users from the {} hiscores.",
        config.usernames.len(),
        config.account_type
    );
    let report = assemble(&client, &config.usernames, &config.batch_options()).await?;
    report.log_summary();

    let (batch, captured_at, failures) = report.into_parts();
    if !batch.users().is_empty() {
        let path = save_batch(&config.output_dir, &batch, &captured_at)?;
        println!("Successfully saved data to {path:?}.");
    }
    if !failures.is_empty() {
        bail!(
            "{} of {} users could not be captured.",
            failures.len(),
            failures.len() + batch.users().len()
        );
    }

    Ok(())
}
