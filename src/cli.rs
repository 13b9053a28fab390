use clap::Parser;
use std::path::PathBuf;

pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_NUMBER"));

#[derive(Parser, Debug)]
#[command(name = "tgh", version = VERSION, about = "Terminal dashboard for GitHub Actions")]
pub struct Cli {
    /// Repository checkout to inspect (defaults to the current directory)
    pub repo_path: Option<PathBuf>,

    /// Write debug logs to this file
    #[arg(long, value_name = "FILE")]
    pub debug: Option<PathBuf>,

    /// Runs list refresh interval in seconds
    #[arg(short, long, default_value_t = crate::app::RUNS_POLL_INTERVAL_SECS)]
    pub interval: u64,

    /// Maximum number of runs to fetch
    #[arg(short, long, default_value_t = crate::app::DEFAULT_RUN_LIMIT)]
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["tgh"]);
        assert_eq!(cli.repo_path, None);
        assert_eq!(cli.debug, None);
        assert_eq!(cli.interval, 10);
        assert_eq!(cli.limit, 30);
    }

    #[test]
    fn explicit_args() {
        let cli = Cli::parse_from(["tgh", "../other", "--debug", "/tmp/tgh.log", "-i", "5", "-l", "50"]);
        assert_eq!(cli.repo_path, Some(PathBuf::from("../other")));
        assert_eq!(cli.debug, Some(PathBuf::from("/tmp/tgh.log")));
        assert_eq!(cli.interval, 5);
        assert_eq!(cli.limit, 50);
    }
}
