//! Configuration for SimpleChat
//!
//! Centralized configuration with sensible defaults.

/// Port the relay listens on (and the client dials) unless told otherwise
pub const DEFAULT_PORT: u16 = 5555;

/// Host the client dials unless told otherwise
pub const DEFAULT_HOST: &str = "localhost";

/// Relay configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Interface to bind the listener to
    pub bind_host: String,

    /// TCP listen port (0 picks an ephemeral port)
    pub port: u16,

    /// Connection write timeout (milliseconds, 0 disables)
    pub write_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            write_timeout_ms: 5000,
        }
    }
}

impl ServerConfig {
    /// Create a new config builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Address string handed to `TcpListener::bind`
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

/// Builder for ServerConfig
#[derive(Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Set the interface to bind
    pub fn bind_host(mut self, host: impl Into<String>) -> Self {
        self.config.bind_host = host.into();
        self
    }

    /// Set the listen port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> ServerConfig {
        self.config
    }
}

/// Client endpoint and identity
///
/// Host and port may only change while the client holds no connection;
/// `ChatClient` enforces that, this struct is plain data.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Identity sent with `#login` once connected
    pub login_id: String,

    /// Relay host
    pub host: String,

    /// Relay port
    pub port: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            login_id: String::new(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the login identity
    pub fn login_id(mut self, id: impl Into<String>) -> Self {
        self.config.login_id = id.into();
        self
    }

    /// Set the relay host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the relay port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

/// Parse a port argument, as typed by a user or operator
pub fn parse_port(raw: &str) -> Option<u16> {
    raw.trim().parse::<u16>().ok()
}
