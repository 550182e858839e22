use std::time::Duration;

pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_millis(2000);
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_millis(2000);
pub const DEFAULT_CHARSET: &str = "UTF-8";
pub const DEFAULT_CONTENT_TYPE: &str = "application/xml";
pub const DEFAULT_CONTEXT_TAG: &str = "restx";

/// Per-attempt timeouts handed to the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub socket: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_CONNECTION_TIMEOUT,
            socket: DEFAULT_SOCKET_TIMEOUT,
        }
    }
}

impl Timeouts {
    pub fn connect(mut self, connect: Duration) -> Self {
        self.connect = connect.max(Duration::from_millis(1));
        self
    }

    pub fn socket(mut self, socket: Duration) -> Self {
        self.socket = socket.max(Duration::from_millis(1));
        self
    }
}

/// Timeout retry budgets and their switches.
///
/// Budgets count remaining retries, not attempts: a budget of 2 allows up to
/// three physical sends for that failure category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetrySettings {
    pub connection_budget: u32,
    pub socket_budget: u32,
    pub connection_retry_enabled: bool,
    pub socket_retry_enabled: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            connection_budget: 0,
            socket_budget: 0,
            connection_retry_enabled: true,
            socket_retry_enabled: true,
        }
    }
}

impl RetrySettings {
    pub const fn disabled() -> Self {
        Self {
            connection_budget: 0,
            socket_budget: 0,
            connection_retry_enabled: false,
            socket_retry_enabled: false,
        }
    }

    pub const fn connection_budget(mut self, budget: u32) -> Self {
        self.connection_budget = budget;
        self
    }

    pub const fn socket_budget(mut self, budget: u32) -> Self {
        self.socket_budget = budget;
        self
    }

    pub const fn connection_retry_enabled(mut self, enabled: bool) -> Self {
        self.connection_retry_enabled = enabled;
        self
    }

    pub const fn socket_retry_enabled(mut self, enabled: bool) -> Self {
        self.socket_retry_enabled = enabled;
        self
    }
}
