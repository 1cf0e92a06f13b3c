use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config::parse_bind_address;

#[derive(Debug, Parser, Clone, PartialEq, Eq)]
#[command(name = "simple_chatbot")]
#[command(
    about = "Chat web service that answers with live lookups through OpenAI function calling",
    long_about = "Chat web service that answers with live lookups through OpenAI function calling\n\nConfig file loading:\n  - --config <path> (explicit file, overrides default path discovery)\n  - Default search path when --config is not provided:\n    1. $XDG_CONFIG_HOME/simple-chatbot/config.toml\n    2. ~/.config/simple-chatbot/config.toml\n\nEnvironment variables (OPENAI_API_KEY, OPENAI_MODEL, OPENAI_BASE_URL,\nOMDB_API_KEY, BIND_ADDRESS) and a local .env file override the config file."
)]
pub struct CliArgs {
    /// Load config from this file path instead of the default discovery path.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Address to listen on, overriding the configured bind address.
    #[arg(long, value_name = "HOST:PORT", value_parser = parse_bind_address)]
    pub bind: Option<SocketAddr>,

    /// Enable debug logging, including redacted outbound HTTP traffic.
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::CliArgs;
    use clap::Parser;

    #[test]
    fn parse_defaults() {
        let args = CliArgs::try_parse_from(["simple_chatbot"]).expect("should parse");
        assert_eq!(args.config, None);
        assert_eq!(args.bind, None);
        assert!(!args.verbose);
    }

    #[test]
    fn parse_config_flag() {
        let args = CliArgs::try_parse_from(["simple_chatbot", "--config", "/tmp/custom.toml"])
            .expect("parse");
        assert_eq!(
            args.config.as_deref(),
            Some(std::path::Path::new("/tmp/custom.toml"))
        );
    }

    #[test]
    fn parse_bind_and_verbose() {
        let args = CliArgs::try_parse_from(["simple_chatbot", "--bind", "0.0.0.0:8080", "-v"])
            .expect("parse");
        assert_eq!(args.bind.map(|addr| addr.port()), Some(8080));
        assert!(args.verbose);
    }

    #[test]
    fn parse_rejects_invalid_bind() {
        let err = CliArgs::try_parse_from(["simple_chatbot", "--bind", "not-an-address"])
            .expect_err("invalid bind");
        assert!(err.to_string().contains("invalid socket address"));
    }
}
