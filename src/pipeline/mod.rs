//! Deployment pipeline orchestration.
//!
//! A single directed run over fixed stages:
//!
//! ```text
//! Clean -> Compile -> SelectNetwork -> Deploy -> Rewrite -> Build -> Publish -> Report
//! ```
//!
//! - `Clean`, `Compile`, `Deploy` and `Build` delegate to `[stages.*]` commands
//! - `Rewrite` points source asset references at the store (prebuild)
//! - `Publish` pushes the built entry document and its bundles (postbuild)
//! - `Report` persists the merged [`PublicationReport`]
//!
//! `wttp rewrite` and `wttp publish` run only their own stage, against the
//! store given with `--address`. Nothing is retried; the first error ends
//! the run.

mod services;

pub use services::Services;

use anyhow::{Context, Result};
use std::fmt;
use std::process::Output;
use std::sync::Arc;

use crate::asset::{AssetResolver, StrategySelector};
use crate::cli::{Cli, Commands};
use crate::config::{PublishConfig, StageConfig};
use crate::error::PublishError;
use crate::hooks;
use crate::publish::{BundlePublisher, ChunkUploader, Publisher};
use crate::report::PublicationReport;
use crate::rewrite::address::{UNKNOWN_NETWORK, is_store_address, network_alias};
use crate::rewrite::{AddressBuilder, Rewriter};
use crate::store::{MemoryStore, SubmissionQueue};
use crate::utils::exec::stdout_lines;
use crate::{debug, log};

/// Store address used when a dry run skips the deploy command.
pub const DRY_RUN_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

// =============================================================================
// Stages
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Clean,
    Compile,
    SelectNetwork,
    Deploy,
    Rewrite,
    Build,
    Publish,
    Report,
}

impl Stage {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Compile => "compile",
            Self::SelectNetwork => "network",
            Self::Deploy => "deploy",
            Self::Rewrite => "rewrite",
            Self::Build => "build",
            Self::Publish => "publish",
            Self::Report => "report",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which part of the pipeline a subcommand runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Everything, deploying a new store unless `--address` is given.
    Deploy,
    /// Prebuild only.
    Rewrite,
    /// Postbuild only.
    Publish,
}

impl RunMode {
    pub const fn from_command(command: &Commands) -> Self {
        match command {
            Commands::Deploy { .. } => Self::Deploy,
            Commands::Rewrite { .. } => Self::Rewrite,
            Commands::Publish { .. } => Self::Publish,
        }
    }

    pub const fn stages(self) -> &'static [Stage] {
        use Stage::*;
        match self {
            Self::Deploy => &[
                Clean,
                Compile,
                SelectNetwork,
                Deploy,
                Rewrite,
                Build,
                Publish,
                Report,
            ],
            Self::Rewrite => &[SelectNetwork, Deploy, Rewrite, Report],
            Self::Publish => &[SelectNetwork, Deploy, Publish, Report],
        }
    }
}

// =============================================================================
// Deploy Output
// =============================================================================

/// Store address printed by the deploy command: the last line carrying a
/// `0x` + 40 hex digit token.
pub fn parse_deploy_address(lines: &[String]) -> Result<String, PublishError> {
    let found = lines.iter().rev().find_map(|line| {
        line.split(|c: char| c.is_whitespace() || matches!(c, ':' | ',' | '"' | '\'' | '='))
            .find(|token| is_store_address(token))
    });

    match (found, lines.last()) {
        (Some(address), _) => Ok(address.to_string()),
        (None, Some(last)) => Err(PublishError::InvalidAddress(last.clone())),
        (None, None) => Err(PublishError::MissingAddress),
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Run the stages selected by the CLI subcommand.
pub async fn run(cli: &Cli, config: Arc<PublishConfig>) -> Result<()> {
    let mode = RunMode::from_command(&cli.command);
    let report = Pipeline::new(config, mode, cli.args().address.clone())
        .run()
        .await?;

    if !report.is_complete() {
        log!("warning"; "{} resource(s) only partially uploaded", report.partial_uploads.len());
    }
    Ok(())
}

pub struct Pipeline {
    config: Arc<PublishConfig>,
    mode: RunMode,
    /// `--address`: skip the deploy command and use this store.
    given_address: Option<String>,
    services: Option<Services>,
    publisher: Option<Arc<Publisher>>,
    preview: Option<Arc<MemoryStore>>,
    network: Option<String>,
    address: Option<String>,
    report: PublicationReport,
}

impl Pipeline {
    pub fn new(config: Arc<PublishConfig>, mode: RunMode, given_address: Option<String>) -> Self {
        Self {
            config,
            mode,
            given_address,
            services: None,
            publisher: None,
            preview: None,
            network: None,
            address: None,
            report: PublicationReport::new(),
        }
    }

    /// Use `services` instead of connecting once the address is known.
    pub fn with_services(mut self, services: Services) -> Self {
        self.services = Some(services);
        self
    }

    /// Run every stage of the mode in order.
    ///
    /// On failure, the report is still written once a store address is
    /// known so partial uploads are not lost.
    pub async fn run(mut self) -> Result<PublicationReport> {
        for &stage in self.mode.stages() {
            debug!("pipeline"; "-> {}", stage);
            if let Err(err) = self.run_stage(stage).await {
                if stage != Stage::Report
                    && self.report.store_address.is_some()
                    && let Err(save_err) = self.save_report()
                {
                    log!("report"; "failed to save: {:#}", save_err);
                }
                return Err(err);
            }
        }
        Ok(self.report)
    }

    async fn run_stage(&mut self, stage: Stage) -> Result<()> {
        let stages = &self.config.stages;
        match stage {
            Stage::Clean => self.external(stage, &stages.clean).await.map(drop),
            Stage::Compile => self.external(stage, &stages.compile).await.map(drop),
            Stage::SelectNetwork => self.select_network(),
            Stage::Deploy => self.deploy().await,
            Stage::Rewrite => self.rewrite().await,
            Stage::Build => self.external(stage, &stages.build).await.map(drop),
            Stage::Publish => self.publish().await,
            Stage::Report => self.finish_report(),
        }
    }

    // -------------------------------------------------------------------------
    // stage bodies
    // -------------------------------------------------------------------------

    fn select_network(&mut self) -> Result<()> {
        let name = self
            .config
            .network
            .name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .ok_or(PublishError::MissingNetwork)?;

        let alias = network_alias(&name);
        if alias == UNKNOWN_NETWORK {
            log!("warning"; "network `{}` has no known alias, addresses use `{}`", name, alias);
        } else {
            log!("network"; "{} ({})", name, alias);
        }

        self.report.network = Some(name.clone());
        self.network = Some(name);
        Ok(())
    }

    async fn deploy(&mut self) -> Result<()> {
        let address = match (&self.given_address, self.mode) {
            (Some(address), _) => {
                log!("deploy"; "using existing store {}", address);
                address.clone()
            }
            (None, RunMode::Deploy) => self.deploy_store().await?,
            (None, _) => return Err(PublishError::MissingAddress.into()),
        };

        if !is_store_address(&address) {
            return Err(PublishError::InvalidAddress(address).into());
        }

        self.report.store_address = Some(address.clone());
        self.address = Some(address);
        Ok(())
    }

    async fn deploy_store(&self) -> Result<String> {
        if self.config.dry_run {
            log!("deploy"; "dry run, using placeholder store {}", DRY_RUN_ADDRESS);
            return Ok(DRY_RUN_ADDRESS.to_string());
        }

        let output = self
            .external(Stage::Deploy, &self.config.stages.deploy)
            .await?
            .ok_or(PublishError::MissingAddress)?;
        let address = parse_deploy_address(&stdout_lines(&output))?;
        log!("deploy"; "store deployed at {}", address);
        Ok(address)
    }

    async fn rewrite(&mut self) -> Result<()> {
        let publisher = self.publisher()?;
        let config = &self.config;

        let rewriter = Rewriter::new(
            AssetResolver::new(config.source.root.clone(), config.source.asset_dirs.clone()),
            StrategySelector::new(config.strategy.inline_bundles),
            publisher,
            self.addresses()?,
            config.source.extensions.clone(),
        )
        .dry_run(config.dry_run);

        let modified = rewriter.rewrite_dir(&mut self.report).await?;
        if config.dry_run {
            log!("dry-run"; "{} source file(s) would be updated", modified.len());
        } else {
            log!("rewrite"; "{} source file(s) updated", modified.len());
        }
        Ok(())
    }

    async fn publish(&mut self) -> Result<()> {
        let publisher = self.publisher()?;
        let config = &self.config;

        let bundles = BundlePublisher::new(
            publisher,
            StrategySelector::new(config.strategy.inline_bundles),
            self.addresses()?,
            config.build.output.clone(),
            config.build.entry.clone(),
        )
        .dry_run(config.dry_run);
        bundles.publish(&mut self.report).await?;
        Ok(())
    }

    fn finish_report(&self) -> Result<()> {
        self.save_report()?;

        if let Some(store) = &self.preview {
            for path in store.paths() {
                let size = store.read(&path).map_or(0, |content| content.len());
                log!("dry-run"; "{} ({} bytes)", path, size);
            }
        }

        let report = &self.report;
        log!(
            "report";
            "{} resource(s), {} chunk(s), {} pinned file(s) ({} bytes)",
            report.resources,
            report.chunks_sent,
            report.pinned_files,
            report.pinned_bytes
        );
        for partial in &report.partial_uploads {
            let confirmed = partial.last_confirmed.map_or(0, |i| i + 1);
            log!(
                "warning";
                "{} stopped after {}/{} chunk(s): {}",
                partial.path,
                confirmed,
                partial.total,
                partial.error
            );
        }
        Ok(())
    }

    fn save_report(&self) -> Result<()> {
        let path = &self.config.report.path;
        self.report.save(path)?;
        log!("report"; "saved {}", self.config.root_relative(path).display());
        Ok(())
    }

    // -------------------------------------------------------------------------
    // helpers
    // -------------------------------------------------------------------------

    /// Run an external stage command off the async runtime.
    ///
    /// Dry runs log the command and skip it.
    async fn external(&self, stage: Stage, command: &StageConfig) -> Result<Option<Output>> {
        if self.config.dry_run {
            if command.is_enabled() {
                log!(stage.name(); "dry run, skipping `{}`", command.command.join(" "));
            }
            return Ok(None);
        }

        let vars =
            hooks::build_wttp_vars(&self.config, self.network.as_deref(), self.address.as_deref());
        let config = Arc::clone(&self.config);
        let command = command.clone();
        let name = stage.name();

        tokio::task::spawn_blocking(move || hooks::run_stage(name, &command, &config, &vars))
            .await
            .with_context(|| format!("stage `{name}` did not finish"))?
            .map_err(|source| PublishError::StageFailed { stage: name, source }.into())
    }

    fn addresses(&self) -> Result<AddressBuilder> {
        let address = self.address.as_deref().ok_or(PublishError::MissingAddress)?;
        Ok(AddressBuilder::new(
            &self.config.store.scheme,
            address,
            self.network.as_deref(),
        ))
    }

    /// Shared publisher, connecting to the services on first use.
    fn publisher(&mut self) -> Result<Arc<Publisher>> {
        if let Some(publisher) = &self.publisher {
            return Ok(Arc::clone(publisher));
        }

        let services = match self.services.take() {
            Some(services) => services,
            None => {
                let address = self.address.as_deref().ok_or(PublishError::MissingAddress)?;
                Services::connect(&self.config, address)?
            }
        };

        self.preview = services.preview;
        let queue = Arc::new(SubmissionQueue::new(services.store));
        let publisher = Arc::new(Publisher::new(
            ChunkUploader::new(queue, self.config.store.chunk_size),
            services.pinner,
            self.config.pinning.gateway.clone(),
            self.config.store.on_chunk_failure,
        ));

        self.publisher = Some(Arc::clone(&publisher));
        Ok(publisher)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config_at;
    use crate::pinning::StaticPinner;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const STORE: &str = "0x1111111111111111111111111111111111111111";

    const INDEX: &str = concat!(
        r#"<html><head><script defer="defer" src="/static/js/main.3c4d.js"></script>"#,
        r#"<link href="/static/css/main.1a2b.css" rel="stylesheet"></head></html>"#
    );

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    /// Project with one source file referencing a logo and a built app.
    fn project(dir: &Path) {
        fs::create_dir_all(dir.join("src/assets")).unwrap();
        fs::write(dir.join("src/assets/logo.png"), [7u8; 32]).unwrap();
        fs::write(
            dir.join("src/App.js"),
            "import logo from \"./logo.png\";\nexport default logo;\n",
        )
        .unwrap();

        fs::create_dir_all(dir.join("build/static/css")).unwrap();
        fs::create_dir_all(dir.join("build/static/js")).unwrap();
        fs::write(dir.join("build/index.html"), INDEX).unwrap();
        fs::write(dir.join("build/static/css/main.1a2b.css"), "body{}").unwrap();
        fs::write(dir.join("build/static/js/main.3c4d.js"), "run()").unwrap();
    }

    fn config(dir: &Path, network: Option<&str>, dry_run: bool) -> Arc<PublishConfig> {
        let mut config = test_config_at(dir, "[pinning]\ngateway = \"https://gw/ipfs\"");
        config.dry_run = dry_run;
        config.network.name = network.map(str::to_string);
        Arc::new(config)
    }

    fn dry_config(dir: &Path, network: Option<&str>) -> Arc<PublishConfig> {
        config(dir, network, true)
    }

    fn memory_services(store: &Arc<MemoryStore>) -> Services {
        Services::new(store.clone(), Arc::new(StaticPinner("Qm123")))
    }

    #[test]
    fn test_parse_deploy_address_last_match() {
        let output = lines(
            "Compiling...\n\
             old 0x2222222222222222222222222222222222222222\n\
             WTTP site deployed to: 0xAbCdEf0123456789abcdef0123456789ABCDEF01\n\
             done",
        );
        assert_eq!(
            parse_deploy_address(&output).unwrap(),
            "0xAbCdEf0123456789abcdef0123456789ABCDEF01"
        );
    }

    #[test]
    fn test_parse_deploy_address_errors() {
        let err = parse_deploy_address(&lines("deployed\n0x1234")).unwrap_err();
        assert!(matches!(err, PublishError::InvalidAddress(ref line) if line == "0x1234"));

        let err = parse_deploy_address(&[]).unwrap_err();
        assert!(matches!(err, PublishError::MissingAddress));
    }

    #[test]
    fn test_mode_stages() {
        assert_eq!(RunMode::Deploy.stages().len(), 8);
        assert_eq!(RunMode::Deploy.stages()[0], Stage::Clean);
        assert_eq!(
            RunMode::Rewrite.stages(),
            &[Stage::SelectNetwork, Stage::Deploy, Stage::Rewrite, Stage::Report]
        );
        assert!(!RunMode::Publish.stages().contains(&Stage::Rewrite));
    }

    #[tokio::test]
    async fn test_missing_network_fails() {
        let dir = TempDir::new().unwrap();
        project(dir.path());

        let err = Pipeline::new(dry_config(dir.path(), None), RunMode::Deploy, None)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PublishError>(),
            Some(PublishError::MissingNetwork)
        ));
    }

    #[tokio::test]
    async fn test_rewrite_requires_address() {
        let dir = TempDir::new().unwrap();
        project(dir.path());

        let err = Pipeline::new(dry_config(dir.path(), Some("base")), RunMode::Rewrite, None)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PublishError>(),
            Some(PublishError::MissingAddress)
        ));
    }

    #[tokio::test]
    async fn test_invalid_given_address() {
        let dir = TempDir::new().unwrap();
        project(dir.path());

        let err = Pipeline::new(
            dry_config(dir.path(), Some("base")),
            RunMode::Publish,
            Some("0xnothex".into()),
        )
        .run()
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PublishError>(),
            Some(PublishError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn test_deploy_end_to_end() {
        let dir = TempDir::new().unwrap();
        project(dir.path());
        // no stage commands configured, so nothing external runs
        let config = config(dir.path(), Some("polygon_mainnet"), false);
        let store = Arc::new(MemoryStore::new());

        let report = Pipeline::new(config.clone(), RunMode::Deploy, Some(STORE.into()))
            .with_services(memory_services(&store))
            .run()
            .await
            .unwrap();

        // prebuild: source literal points at the store
        let app = fs::read_to_string(dir.path().join("src/App.js")).unwrap();
        assert_eq!(
            app,
            format!("const logo = \"wttp://{STORE}/assets/logo.png/?chain=poly\";\nexport default logo;\n")
        );
        assert_eq!(
            store.read("/assets/logo.png").unwrap(),
            r#"{"link":"https://gw/ipfs/Qm123","type":"image/png"}"#
        );

        // postbuild: entry document and bundles
        let order: Vec<_> = store.submissions().into_iter().map(|(p, _)| p).collect();
        assert_eq!(order, vec!["/assets/logo.png", "/", "/styles.css", "/script.js"]);
        assert!(store.read("/").unwrap().contains(&format!("wttp://{STORE}/script.js")));

        // report
        assert_eq!(report.store_address.as_deref(), Some(STORE));
        assert_eq!(report.network.as_deref(), Some("polygon_mainnet"));
        assert_eq!(report.pinned_files, 1);
        assert_eq!(report.resources, 4);
        assert!(report.is_complete());

        let saved = fs::read_to_string(&config.report.path).unwrap();
        let saved: PublicationReport = serde_json::from_str(&saved).unwrap();
        assert_eq!(saved, report);
    }

    #[tokio::test]
    async fn test_dry_run_without_address_uses_placeholder() {
        let dir = TempDir::new().unwrap();
        project(dir.path());
        let store = Arc::new(MemoryStore::new());

        let report = Pipeline::new(dry_config(dir.path(), Some("base")), RunMode::Deploy, None)
            .with_services(memory_services(&store))
            .run()
            .await
            .unwrap();

        assert_eq!(report.store_address.as_deref(), Some(DRY_RUN_ADDRESS));
        assert_eq!(report.resources, 4);
        assert!(store.read("/").unwrap().contains(&format!("wttp://{DRY_RUN_ADDRESS}/script.js")));
    }

    #[tokio::test]
    async fn test_dry_run_leaves_inputs_untouched() {
        let dir = TempDir::new().unwrap();
        project(dir.path());
        let app_before = fs::read(dir.path().join("src/App.js")).unwrap();
        let index_before = fs::read(dir.path().join("build/index.html")).unwrap();
        let store = Arc::new(MemoryStore::new());

        Pipeline::new(dry_config(dir.path(), Some("base")), RunMode::Deploy, None)
            .with_services(memory_services(&store))
            .run()
            .await
            .unwrap();

        assert_eq!(fs::read(dir.path().join("src/App.js")).unwrap(), app_before);
        assert_eq!(fs::read(dir.path().join("build/index.html")).unwrap(), index_before);
        assert!(store.read("/assets/logo.png").is_some());
    }

    #[tokio::test]
    async fn test_failed_run_still_saves_report() {
        let dir = TempDir::new().unwrap();
        project(dir.path());
        fs::remove_file(dir.path().join("build/index.html")).unwrap();
        let config = dry_config(dir.path(), Some("base"));
        let store = Arc::new(MemoryStore::new());

        let err = Pipeline::new(config.clone(), RunMode::Deploy, Some(STORE.into()))
            .with_services(memory_services(&store))
            .run()
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PublishError>(),
            Some(PublishError::MissingEntry(_))
        ));

        let saved: PublicationReport =
            serde_json::from_str(&fs::read_to_string(&config.report.path).unwrap()).unwrap();
        assert_eq!(saved.pinned_files, 1);
    }
}
