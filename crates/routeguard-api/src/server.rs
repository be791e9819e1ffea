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

//! HTTP server implementation using Hyper

use crate::config::{Config, StoreKind};
use crate::error::{ApiError, ApiResult};
use crate::router::Router;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use routeguard_core::{AuditLog, FileGrantStore, GrantStore, MemoryGrantStore, PermissionEngine, Seed};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tracing::{error, info};

/// API server using Hyper
pub struct ApiServer {
    bind_address: SocketAddr,
    router: Arc<Router>,
}

impl ApiServer {
    /// Create a new API server
    pub async fn new(config: Config) -> ApiResult<Self> {
        // Parse bind address
        let bind_address: SocketAddr = config.bind_address.parse().map_err(|e| ApiError::BadRequest {
            message: format!("Invalid bind address: {}", e),
        })?;

        let engine = build_engine(&config).await?;
        let router = Arc::new(Router::new(engine, &config));

        info!("API server created successfully");

        Ok(Self { bind_address, router })
    }

    /// Get the bind address
    pub fn bind_address(&self) -> SocketAddr {
        self.bind_address
    }

    /// Start the server
    pub async fn run(self) -> ApiResult<()> {
        // Create TCP listener
        let listener = TcpListener::bind(self.bind_address).await?;

        info!("Routeguard API listening on http://{}", self.bind_address);
        if self.router.openapi_spec().is_some() {
            info!("OpenAPI document available at http://{}/openapi.json", self.bind_address);
        }

        // Accept connections
        loop {
            let (stream, remote_addr) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            let io = TokioIo::new(stream);
            let router = self.router.clone();

            // Spawn a task to handle the connection
            tokio::task::spawn(async move {
                let service = ServiceBuilder::new().service(service_fn(move |req: Request<Incoming>| {
                    let router = router.clone();
                    async move { Ok::<_, Infallible>(router.handle(req).await) }
                }));

                // Serve the connection
                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Error serving connection from {}: {}", remote_addr, err);
                }
            });
        }
    }
}

/// Assemble the permission engine described by the configuration
pub async fn build_engine(config: &Config) -> ApiResult<PermissionEngine> {
    let (catalog, roles) = Seed::load(&config.seed_path).await?.into_parts()?;

    let store: Arc<dyn GrantStore> = match config.store {
        StoreKind::Memory => {
            info!("Using in-memory grant store");
            Arc::new(MemoryGrantStore::new())
        }
        StoreKind::File => {
            info!("Using file grant store at {}", config.data_dir.display());
            Arc::new(FileGrantStore::open(&config.data_dir).await?)
        }
    };

    Ok(PermissionEngine::new(Arc::new(catalog), Arc::new(roles), store).with_audit_log(Arc::new(AuditLog::new(config.audit_capacity))))
}
