use crate::config::GatewayConfig;
use crate::error::GatewayResult;
use crate::sandbox::CommandExecutor;
use resolve::resolve_within;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

pub mod fetch;
pub mod path;
pub mod resolve;
pub mod tree;

pub use fetch::FileFetcher;
pub use path::validate_path;
pub use tree::{FileNode, NodeType};

#[derive(Debug, Clone, Serialize)]
pub struct TreeListing {
    pub path: String,
    pub tree: Vec<FileNode>,
    /// The listing hit the output limit and the tree is partial
    pub truncated: bool,
}

/// Lists directories inside the allowed root as nested trees.
#[derive(Clone)]
pub struct FileBrowser {
    commands: CommandExecutor,
    config: Arc<GatewayConfig>,
}

impl FileBrowser {
    pub fn new(commands: CommandExecutor, config: Arc<GatewayConfig>) -> Self {
        Self { commands, config }
    }

    pub async fn tree(&self, path: Option<&str>, depth: Option<u8>) -> GatewayResult<TreeListing> {
        let depth = tree::validate_depth(depth.unwrap_or(tree::DEFAULT_DEPTH))?;
        let safe_path = resolve_within(
            &self.commands,
            path.unwrap_or(&self.config.allowed_root),
            &self.config.allowed_root,
        )
        .await?;

        info!("Listing sandbox tree {} (depth {})", safe_path, depth);
        let result = self
            .commands
            .run(&tree::listing_command(&safe_path, depth), None)
            .await?;

        let mut raw = result.stdout.as_str();
        if result.stdout_truncated {
            warn!("Tree listing for {} exceeded the output limit", safe_path);
            // Drop the marker and the line it cut through
            raw = raw
                .strip_suffix(crate::sandbox::TRUNCATION_MARKER)
                .unwrap_or(raw);
            raw = raw.rsplit_once('\n').map(|(head, _)| head).unwrap_or("");
        }

        Ok(TreeListing {
            tree: tree::build(raw, &safe_path),
            path: safe_path,
            truncated: result.stdout_truncated,
        })
    }
}
