// Routeguard
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use routeguard_api::{config::Config, server::ApiServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();

    info!("Starting Routeguard permissions API");

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration: bind_address={}, store={:?}", config.bind_address, config.store);

    // Create and start the API server
    let server = ApiServer::new(config).await?;
    info!("Permissions API started on http://{}", server.bind_address());

    // Start the server
    server.run().await?;

    Ok(())
}
