use crate::cli::args::{CommonArgs, InventoryArgs, InventoryMode, TagArgs, TagCommand};
use crate::cli::output::OutputWriter;
use crate::core::api::XenApi;
use crate::core::inventory::{BuildOptions, InventoryBuilder, InventoryCache};
use crate::core::tags::TagMutator;
use crate::domain::config::XenToolsConfig;
use crate::domain::error::XenResult;
use crate::infrastructure::config::ConfigManager;
use crate::infrastructure::logging;
use crate::infrastructure::xapi::XenSession;
use tracing::warn;

/// Execute the xen-tags command
pub async fn execute_tags(args: TagArgs) -> XenResult<()> {
    let config = prepare(&args.common)?;
    let credentials = ConfigManager::credentials_from_env()?;

    let session = XenSession::login(&credentials, config.global.timeout()).await?;
    let outcome = tag_vm(&session, &args.command).await;
    end_session(session).await;
    outcome
}

/// Execute the xenserver-inventory command
pub async fn execute_inventory(args: InventoryArgs, writer: &dyn OutputWriter) -> XenResult<()> {
    let config = prepare(&args.common)?;
    let credentials = ConfigManager::credentials_from_env()?;

    let cache = InventoryCache::from_config(&config.cache);
    let options = BuildOptions {
        per_interface_passes: config.inventory.per_interface_passes,
    };
    let refresh = args.refresh || config.cache.refresh;

    let session = XenSession::login(&credentials, config.global.timeout()).await?;
    let outcome = write_inventory(&session, &args.mode(), &cache, options, refresh, writer).await;
    end_session(session).await;
    outcome
}

/// Apply a tag command through any XAPI implementation
pub async fn tag_vm<A: XenApi + ?Sized>(api: &A, command: &TagCommand) -> XenResult<()> {
    TagMutator::new(api)
        .apply(command.action(), command.vm_name(), command.tag())
        .await
}

/// Produce the requested inventory view and write it out
pub async fn write_inventory<A: XenApi + ?Sized>(
    api: &A,
    mode: &InventoryMode,
    cache: &InventoryCache,
    options: BuildOptions,
    refresh: bool,
    writer: &dyn OutputWriter,
) -> XenResult<()> {
    let builder = InventoryBuilder::with_options(api, options);
    match mode {
        InventoryMode::List => {
            let inventory = cache.cached_inventory(&builder, refresh).await?;
            writer.write_inventory(&inventory)?;
        }
        InventoryMode::Host(host) => {
            let vars = cache.cached_host(host, &builder, refresh).await?;
            writer.write_host_vars(&vars)?;
        }
    }
    Ok(())
}

fn prepare(common: &CommonArgs) -> XenResult<XenToolsConfig> {
    let mut config = ConfigManager::new().load_file(common.config.as_deref())?;

    if !common.quiet {
        // Fails only if a subscriber is already installed
        let _ = logging::init_logging(&config.global.log_level, common.verbose);
    }

    ConfigManager::apply_env(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

async fn end_session(session: XenSession) {
    if let Err(e) = session.logout().await {
        warn!("Logout failed: {}", e);
    }
}
