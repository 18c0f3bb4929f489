use may::coroutine::JoinHandle;
use may_minihttp::HttpService;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

/// Wrapper around may_minihttp's HTTP server
///
/// Provides a typed interface for starting a server and keeping hold of the
/// listening socket it bound.
pub struct HttpServer<T>(pub T);

/// Handle to a running HTTP server
///
/// Carries the bound address (so callers can log it or close over it) and
/// the server coroutine handle.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the server actually bound, including the resolved port.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Port the server actually bound. In development this is the resolved
    /// free port, not necessarily the preferred one.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Wait for the server to be ready to accept connections
    ///
    /// Polls the bound address with TCP connection attempts. Useful in tests
    /// to ensure the server is fully started before sending requests.
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` if the server doesn't become ready within ~250ms.
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Stop the server, cancelling the server coroutine and waiting for it
    /// to finish. Consumes the handle.
    pub fn stop(self) {
        // SAFETY: may's coroutine cancel is marked unsafe by the runtime.
        // The handle is valid (we own it) and cancellation is the intended
        // shutdown path here.
        unsafe {
            self.handle.coroutine().cancel();
        }
        let _ = self.handle.join();
    }

    /// Block until the server coroutine finishes. The server runs
    /// indefinitely unless stopped externally or an error occurs.
    ///
    /// # Errors
    ///
    /// Returns an error if the server coroutine panicked.
    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}

impl<T: HttpService + Clone + Send + Sync + 'static> HttpServer<T> {
    /// Bind `addr` and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or the port cannot be
    /// bound. A bind failure is never retried here.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
        let handle = may_minihttp::HttpServer(self.0).start(addr)?;
        Ok(ServerHandle { addr, handle })
    }
}
