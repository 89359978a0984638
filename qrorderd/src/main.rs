use qrorderd::daemon::{DaemonConfig, DaemonRuntime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CliMode {
    Run,
    Once,
    Help,
}

fn parse_cli_mode<I>(args: I) -> anyhow::Result<CliMode>
where
    I: IntoIterator<Item = String>,
{
    let mut mode = CliMode::Run;
    for arg in args.into_iter().skip(1) {
        match arg.as_str() {
            "--once" => mode = CliMode::Once,
            "--help" | "-h" => mode = CliMode::Help,
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(mode)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    match parse_cli_mode(std::env::args())? {
        CliMode::Help => {
            println!("Usage: qrorderd [--once]");
            println!("  --once   Run a single intake pass and exit");
            return Ok(());
        }
        CliMode::Once => {
            let config = DaemonConfig::from_env()?;
            let runtime = DaemonRuntime::bootstrap(config).await?;
            let delta = runtime.poll_once().await?;
            println!(
                "listed={}, logged={}, duplicates={}, unmatched={}, failures={}",
                delta.listed,
                delta.logged,
                delta.duplicates,
                delta.unmatched,
                delta.failures.len()
            );
            for failure in &delta.failures {
                eprintln!("[qrorderd] intake warning: {failure}");
            }
            return Ok(());
        }
        CliMode::Run => {}
    }
    let config = DaemonConfig::from_env()?;
    let daemon = DaemonRuntime::bootstrap(config).await?;
    daemon.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cli_mode_defaults_to_run() {
        let mode = parse_cli_mode(vec!["qrorderd".to_string()]).unwrap();
        assert_eq!(mode, CliMode::Run);
    }

    #[test]
    fn parse_cli_mode_supports_once() {
        let mode = parse_cli_mode(vec!["qrorderd".to_string(), "--once".to_string()]).unwrap();
        assert_eq!(mode, CliMode::Once);
    }

    #[test]
    fn parse_cli_mode_supports_help() {
        let mode = parse_cli_mode(vec!["qrorderd".to_string(), "--help".to_string()]).unwrap();
        assert_eq!(mode, CliMode::Help);
    }

    #[test]
    fn parse_cli_mode_rejects_unknown_arguments() {
        let err = parse_cli_mode(vec!["qrorderd".to_string(), "--bogus".to_string()])
            .expect_err("expected rejection");
        assert!(err.to_string().contains("--bogus"));
    }
}
