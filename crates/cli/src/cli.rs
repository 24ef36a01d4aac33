use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "wecom-bot")]
#[command(about = "WeCom bot demo - echoes direct messages, downloads inbound media")]
#[command(version)]
pub struct Cli {
    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Open the client without automation ("smart") mode
    #[arg(long)]
    pub no_smart: bool,

    /// Directory inbound media is saved into
    #[arg(long, value_name = "DIR", default_value = "downloads")]
    pub downloads: PathBuf,

    /// Path to the bridge executable (default: $WECOM_BRIDGE, then PATH)
    #[arg(long, value_name = "FILE")]
    pub bridge: Option<PathBuf>,

    /// Seconds to wait for the operator to complete login
    #[arg(long, value_name = "SECS", default_value_t = 300)]
    pub login_timeout: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["wecom-bot"]);
        assert!(!cli.no_smart);
        assert_eq!(cli.downloads, PathBuf::from("downloads"));
        assert_eq!(cli.login_timeout, 300);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn flags_parse() {
        let cli = Cli::parse_from([
            "wecom-bot",
            "-vv",
            "--no-smart",
            "--downloads",
            "/tmp/media",
            "--login-timeout",
            "60",
        ]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.no_smart);
        assert_eq!(cli.downloads, PathBuf::from("/tmp/media"));
        assert_eq!(cli.login_timeout, 60);
    }
}
