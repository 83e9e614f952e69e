use clap::{Arg, ArgAction, Command};
use log::{info, warn};
use repo_metrics::{urls, MetricsClient, MetricsError, PinningReport, RepositoryRef};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

const COMMANDS: &[(&str, &str)] = &[
    ("commits", "Count commits on the master ref (GraphQL)"),
    ("merged-prs", "Count merged pull requests (GraphQL, paginated)"),
    ("default-branch", "Print the default branch name"),
    ("pinning", "Score version pinning of package.json on the default branch"),
    ("contributors", "List contributors"),
    ("pulls", "List closed pull requests (first page)"),
    ("repo", "Print repository metadata"),
    ("report", "Collect every metric, recording failures per metric"),
];

pub fn build_cli() -> Command {
    let mut cmd = Command::new("repo-metrics")
        .about("Fetch repository health inputs from GitHub")
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .num_args(1)
                .global(true)
                .help("Override RUST_LOG level (e.g., info, debug)"),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .help("Print version and exit")
                .action(ArgAction::SetTrue),
        );
    for (name, about) in COMMANDS {
        cmd = cmd.subcommand(
            Command::new(*name).about(*about).arg(
                Arg::new("url")
                    .required(true)
                    .help("Repository web URL, e.g. https://github.com/owner/name"),
            ),
        );
    }
    cmd
}

pub fn init_logging(level: Option<&str>) {
    // Explicit level wins over RUST_LOG; default to info.
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(lvl) = level {
        builder.parse_filters(lvl);
    }
    builder.init();
}

#[derive(Debug, Serialize)]
struct MetricsReport {
    repository: RepositoryRef,
    code_tab_url: String,
    commits: Option<u64>,
    merged_pull_requests: Option<u64>,
    default_branch: Option<String>,
    pinning: Option<PinningReport>,
    contributors: Option<usize>,
    closed_pull_requests: Option<usize>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    errors: BTreeMap<&'static str, String>,
}

fn record<T>(
    errors: &mut BTreeMap<&'static str, String>,
    metric: &'static str,
    res: Result<T, MetricsError>,
) -> Option<T> {
    match res {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("{} failed ({}): {}", metric, e.code(), e);
            errors.insert(metric, e.to_string());
            None
        }
    }
}

async fn report(client: &MetricsClient, url: &str) -> MetricsReport {
    let repo = client.repository_ref(url);
    let token = client.token();
    let mut errors = BTreeMap::new();
    info!("collecting metrics for {}", repo);

    let commits = record(
        &mut errors,
        "commits",
        client.count_commits(&repo.owner, &repo.name, token).await,
    );
    let merged = record(
        &mut errors,
        "merged_pull_requests",
        client
            .count_merged_pull_requests(&repo.owner, &repo.name, token)
            .await,
    );
    let branch = record(&mut errors, "default_branch", client.default_branch_name(url).await);
    let pinning = record(&mut errors, "pinning", client.version_pinning(url).await);
    let contributors = record(&mut errors, "contributors", client.list_contributors(url).await);
    let pulls = record(
        &mut errors,
        "closed_pull_requests",
        client.list_closed_pull_requests(url).await,
    );

    MetricsReport {
        code_tab_url: urls::code_tab_url(client.config(), url),
        repository: repo,
        commits,
        merged_pull_requests: merged,
        default_branch: branch,
        pinning,
        contributors: contributors.map(|c| c.len()),
        closed_pull_requests: pulls.map(|p| p.len()),
        errors,
    }
}

pub async fn run_command(client: &MetricsClient, name: &str, url: &str) -> anyhow::Result<Value> {
    let repo = client.repository_ref(url);
    let token = client.token();
    let out = match name {
        "commits" => serde_json::json!({
            "repository": repo,
            "commits": client.count_commits(&repo.owner, &repo.name, token).await?,
        }),
        "merged-prs" => serde_json::json!({
            "repository": repo,
            "merged_pull_requests": client.count_merged_pull_requests(&repo.owner, &repo.name, token).await?,
        }),
        "default-branch" => serde_json::json!({
            "repository": repo,
            "default_branch": client.default_branch_name(url).await?,
        }),
        "pinning" => serde_json::to_value(client.version_pinning(url).await?)?,
        "contributors" => serde_json::to_value(client.list_contributors(url).await?)?,
        "pulls" => serde_json::to_value(client.list_closed_pull_requests(url).await?)?,
        "repo" => serde_json::to_value(client.get_repository(url).await?)?,
        "report" => serde_json::to_value(report(client, url).await)?,
        other => anyhow::bail!("unknown command: {}", other),
    };
    Ok(out)
}
