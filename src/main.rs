mod cli;

use repo_metrics::MetricsClient;

#[tokio::main(flavor = "current_thread")] // every command runs its requests sequentially
async fn main() -> anyhow::Result<()> {
    let cmd = cli::build_cli();
    let matches = cmd.get_matches();
    let log_level = matches.get_one::<String>("log-level").cloned();
    let version_flag = matches.get_flag("version");

    cli::init_logging(log_level.as_deref());

    if version_flag {
        println!("repo-metrics {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let Some((name, sub)) = matches.subcommand() else {
        cli::build_cli().print_help()?;
        return Ok(());
    };
    let Some(url) = sub.get_one::<String>("url") else {
        anyhow::bail!("missing repository URL");
    };

    let client = MetricsClient::from_env()?;
    let out = cli::run_command(&client, name, url).await?;
    println!("{}", serde_json::to_string(&out)?);
    Ok(())
}
