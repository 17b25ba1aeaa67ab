pub mod api;
pub mod auth;

use anyhow::Result;

use crate::config::Config;

pub use api::AppState;
pub use auth::AdminKey;

pub async fn start(config: Config) -> Result<()> {
    api::serve(config).await
}
