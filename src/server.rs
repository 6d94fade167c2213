//! TCP acceptor for name requests.
//!
//! Accepts connections and runs one [`Session`] per connection on its own
//! task. A semaphore caps the number of sessions alive at once; when it is
//! exhausted the acceptor stops accepting and new clients wait in the
//! kernel backlog.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::catalog::{CatalogProvider, NameCatalog};
use crate::config::Config;
use crate::session::{Session, SessionSettings};

/// Server instance
pub struct Server<P> {
    listener: TcpListener,
    catalog: Arc<NameCatalog<P>>,
    settings: Arc<SessionSettings>,
    connection_limit: Arc<Semaphore>,
}

impl<P> Server<P>
where
    P: CatalogProvider + 'static,
{
    /// Bind the listening socket. Must be called within a tokio runtime.
    pub fn bind(config: &Config, catalog: NameCatalog<P>) -> io::Result<Self> {
        let listener = create_listener(config.listen, config.backlog)?;
        let listener = TcpListener::from_std(listener)?;

        Ok(Server {
            listener,
            catalog: Arc::new(catalog),
            settings: Arc::new(SessionSettings::from(config)),
            connection_limit: Arc::new(Semaphore::new(config.max_connections)),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until the process is stopped.
    pub async fn run(self) -> io::Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Sessions already running are left to finish on their own tasks.
    pub async fn run_until<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        info!(address = %addr, "Server listening");
        tokio::pin!(shutdown);

        loop {
            // Wait for a connection slot
            let permit = tokio::select! {
                _ = &mut shutdown => break,
                permit = self.connection_limit.clone().acquire_owned() => {
                    permit.map_err(io::Error::other)?
                }
            };

            let (stream, peer) = tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        error!(error = %e, "Failed to accept connection");
                        continue;
                    }
                },
            };

            debug!(peer = %peer, "New connection");
            let catalog = Arc::clone(&self.catalog);
            let settings = Arc::clone(&self.settings);

            tokio::spawn(
                async move {
                    let mut rng = StdRng::from_os_rng();
                    match Session::new(stream, &settings).run(&*catalog, &mut rng).await {
                        Ok(outcome) => debug!(?outcome, "Session finished"),
                        Err(e) => warn!(error = %e, "Session aborted"),
                    }
                    drop(permit);
                }
                .instrument(info_span!("session", peer = %peer)),
            );
        }

        info!(address = %addr, "Server stopped accepting connections");
        Ok(())
    }
}

/// Create a reusable, non-blocking TCP listener.
fn create_listener(addr: SocketAddr, backlog: i32) -> io::Result<std::net::TcpListener> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;

    Ok(socket.into())
}
