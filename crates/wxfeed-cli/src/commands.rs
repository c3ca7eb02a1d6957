use crate::Cli;
use anyhow::{bail, Context};
use std::sync::Arc;
use wxfeed::FeedConfig;
use wxfeed_client::{BasicCredentials, CredentialProvider, NoCredentials};

pub mod history;
pub mod subscribe;
pub mod watch;

/// Feed settings: the config file if given, then command-line overrides.
pub fn feed_config(cli: &Cli) -> anyhow::Result<FeedConfig> {
    let mut config = match &cli.config {
        Some(path) => FeedConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => FeedConfig {
            host: cli.host.clone(),
            ..FeedConfig::default()
        },
    };

    if cli.http_base.is_some() {
        config.http_base = cli.http_base.clone();
    }
    if cli.ws_base.is_some() {
        config.ws_base = cli.ws_base.clone();
    }
    Ok(config)
}

pub fn credentials(cli: &Cli) -> anyhow::Result<Arc<dyn CredentialProvider>> {
    match (&cli.auth, &cli.user, &cli.password) {
        (Some(encoded), _, _) => Ok(Arc::new(BasicCredentials::new(encoded.trim()))),
        (None, Some(user), Some(password)) => {
            Ok(Arc::new(BasicCredentials::from_user_password(user, password)))
        }
        (None, Some(_), None) => bail!("--user needs --password (or WXFEED_PASSWORD)"),
        _ => Ok(Arc::new(NoCredentials)),
    }
}
