use may::coroutine::JoinHandle;
use may_minihttp::{HttpServerWithHeaders, HttpService};
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Accepts up to 32 request headers; proxies add several of their own.
const MAX_HEADERS: usize = 32;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// `may_minihttp` listener in front of an [`HttpService`].
pub struct HttpServer<T>(pub T);

/// A listening server. Dropping the handle leaves the server running;
/// call [`ServerHandle::stop`] to shut it down.
pub struct ServerHandle {
    addr: SocketAddr,
    accept_loop: JoinHandle<()>,
}

impl ServerHandle {
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Block until the listening socket accepts a connection.
    ///
    /// # Errors
    ///
    /// `TimedOut` when nothing accepts within `timeout`.
    pub fn wait_ready(&self, timeout: Duration) -> io::Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("nothing listening on {} after {timeout:?}", self.addr),
                ));
            }
            thread::sleep(READY_POLL_INTERVAL);
        }
    }

    /// Cancel the accept loop and wait for it to exit.
    ///
    /// Requests already in flight finish on their own coroutines.
    pub fn stop(self) {
        // SAFETY: the accept loop is owned by this handle and never touched
        // again after cancellation.
        #[allow(unsafe_code)]
        unsafe {
            self.accept_loop.coroutine().cancel();
        }
        // a cancelled coroutine reports its unwind as an error
        if self.accept_loop.join().is_err() {
            debug!(addr = %self.addr, "Accept loop unwound on cancel");
        }
        info!(addr = %self.addr, "Listener closed");
    }

    /// Block until the accept loop exits.
    ///
    /// # Errors
    ///
    /// The panic payload if the accept loop panicked.
    pub fn join(self) -> thread::Result<()> {
        self.accept_loop.join()
    }
}

impl<T: HttpService + Clone + Send + Sync + 'static> HttpServer<T> {
    /// Bind the first address `addr` resolves to and start accepting.
    ///
    /// # Errors
    ///
    /// Resolution failures, an address list that resolves to nothing, or a
    /// port that cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let Some(addr) = addr.to_socket_addrs()?.next() else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "listen address resolves to nothing",
            ));
        };
        let accept_loop = HttpServerWithHeaders::<_, MAX_HEADERS>(self.0).start(addr)?;
        Ok(ServerHandle { addr, accept_loop })
    }
}
