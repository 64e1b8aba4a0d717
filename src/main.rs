//! porkbun-ddns - Porkbun dynamic DNS client.

use clap::{CommandFactory, Parser};
use porkbun_ddns::config::Config;
use porkbun_ddns::detector::IpDetector;
use porkbun_ddns::logging::{LogSettings, Logging};
use porkbun_ddns::registrar::PorkbunClient;
use porkbun_ddns::{IpCache, Reconciler};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::process::ExitCode;

/// Help epilogue showing a complete config file.
fn example_help() -> String {
    let example = serde_json::to_string_pretty(&Config::example()).unwrap_or_default();
    format!(
        "Example config.json:\n\n{example}\n\n\
         Config files ending in .toml are read as TOML. Key values starting with $\n\
         are read from the named environment variable."
    )
}

/// True when invoked with no arguments at all.
fn is_bare_invocation<I: IntoIterator>(args: I) -> bool {
    args.into_iter().nth(1).is_none()
}

#[derive(Parser)]
#[command(name = "porkbun-ddns")]
#[command(about = "Porkbun dynamic DNS client")]
#[command(version)]
#[command(after_help = example_help())]
struct Cli {
    /// Path to config file with API keys, domain, and records list
    config: PathBuf,

    /// Path to IP cache file
    cache: PathBuf,

    /// Specify IP manually instead of detecting it
    #[arg(short, long)]
    ip: Option<Ipv4Addr>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Log file path
    #[arg(long, default_value = "/tmp/porkbun.ddns.log")]
    log_file: PathBuf,

    /// Max log file size in MB
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    log_max_size: u64,

    /// Number of backup log files to keep
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u64).range(1..))]
    log_backup_count: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    if is_bare_invocation(std::env::args_os()) {
        // Best effort; nothing useful to do if stderr is gone.
        let _ = Cli::command().write_long_help(&mut std::io::stderr());
        return ExitCode::FAILURE;
    }

    let cli = Cli::parse();

    let _logging = Logging::init(&LogSettings {
        debug: cli.debug,
        file: cli.log_file.clone(),
        max_size_mb: cli.log_max_size,
        backup_count: usize::try_from(cli.log_backup_count).unwrap_or(usize::MAX),
    });

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_from(&cli.config)?;

    let ip = match cli.ip {
        Some(ip) => {
            tracing::debug!("Using manually specified IP: {}", ip);
            ip
        }
        None => {
            let detector = IpDetector::with_service(config.ip_service.clone())?;
            let ip = detector.detect_ipv4().await?;
            tracing::debug!("Auto-detected external IP: {}", ip);
            ip
        }
    };

    let registrar = PorkbunClient::new(config.api())?;
    let reconciler = Reconciler::new(
        Box::new(registrar),
        IpCache::new(cli.cache),
        config.domain,
        config.records,
    )
    .with_strategy(config.update_strategy);

    reconciler.run(ip).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bare_invocation() {
        assert!(is_bare_invocation(["porkbun-ddns"]));
        assert!(is_bare_invocation(Vec::<String>::new()));
        assert!(!is_bare_invocation(["porkbun-ddns", "config.json"]));
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["porkbun-ddns", "config.json", "ip.cache"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert_eq!(cli.cache, PathBuf::from("ip.cache"));
        assert_eq!(cli.ip, None);
        assert!(!cli.debug);
        assert_eq!(cli.log_file, PathBuf::from("/tmp/porkbun.ddns.log"));
        assert_eq!(cli.log_max_size, 1);
        assert_eq!(cli.log_backup_count, 3);
    }

    #[test]
    fn test_cache_is_required() {
        assert!(Cli::try_parse_from(["porkbun-ddns", "config.json"]).is_err());
    }

    #[test]
    fn test_manual_ip() {
        let cli = Cli::try_parse_from(["porkbun-ddns", "c.json", "ip.cache", "-i", "203.0.113.5"])
            .unwrap();
        assert_eq!(cli.ip, Some(Ipv4Addr::new(203, 0, 113, 5)));

        let cli =
            Cli::try_parse_from(["porkbun-ddns", "c.json", "ip.cache", "--ip", "198.51.100.7"])
                .unwrap();
        assert_eq!(cli.ip, Some(Ipv4Addr::new(198, 51, 100, 7)));
    }

    #[test]
    fn test_non_ipv4_manual_ip_rejected() {
        assert!(
            Cli::try_parse_from(["porkbun-ddns", "c.json", "ip.cache", "-i", "2001:db8::1"])
                .is_err()
        );
        assert!(
            Cli::try_parse_from(["porkbun-ddns", "c.json", "ip.cache", "-i", "not-an-ip"])
                .is_err()
        );
    }

    #[test]
    fn test_log_bounds() {
        let base = ["porkbun-ddns", "c.json", "ip.cache"];
        for flag in ["--log-max-size", "--log-backup-count"] {
            let args: Vec<&str> = base.iter().copied().chain([flag, "0"]).collect();
            assert!(Cli::try_parse_from(args).is_err(), "{flag} 0 accepted");
        }

        let cli = Cli::try_parse_from(
            base.iter()
                .copied()
                .chain(["--log-max-size", "5", "--log-backup-count", "7", "--debug"]),
        )
        .unwrap();
        assert_eq!(cli.log_max_size, 5);
        assert_eq!(cli.log_backup_count, 7);
        assert!(cli.debug);
    }

    #[test]
    fn test_help_embeds_example_config() {
        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("Example config.json"));
        assert!(help.contains("\"secretapikey\": \"sk1_key\""));
        assert!(help.contains("\"name\": \"@\""));
    }

    #[tokio::test]
    async fn test_manual_ip_skips_resolution() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/all.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "ip_addr": "198.51.100.1" })),
            )
            .expect(0)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/dns/retrieve/example.com"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "status": "SUCCESS", "records": [] })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/dns/create/example.com"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "status": "SUCCESS", "id": 1 })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        let cache_path = dir.path().join("ip.cache");
        std::fs::write(
            &config_path,
            serde_json::json!({
                "endpoint": mock_server.uri(),
                "ip_service": format!("{}/all.json", mock_server.uri()),
                "apikey": "pk1",
                "secretapikey": "sk1",
                "domain": "example.com",
                "records": [{ "name": "www" }]
            })
            .to_string(),
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            OsStr::new("porkbun-ddns"),
            config_path.as_os_str(),
            cache_path.as_os_str(),
            OsStr::new("--ip"),
            OsStr::new("203.0.113.5"),
        ])
        .unwrap();

        run(cli).await.unwrap();
        assert_eq!(std::fs::read_to_string(&cache_path).unwrap(), "203.0.113.5");
    }

    #[tokio::test]
    async fn test_missing_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            OsStr::new("porkbun-ddns"),
            dir.path().join("missing.json").as_os_str(),
            dir.path().join("ip.cache").as_os_str(),
        ])
        .unwrap();

        let err = run(cli).await.unwrap_err();
        assert!(err.to_string().contains("Configuration error"));
    }
}
