/// Log tags identifying the subsystem a message comes from
///
/// Each tag maps to a `--debug-<key>` command-line flag that enables its
/// debug-level output.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Webserver,
    Websocket,
    Storage,
    Security,
    Topics,
}

impl LogTag {
    /// Key used in `--debug-<key>` / `--verbose-<key>` flags
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::System => "system",
            LogTag::Config => "config",
            LogTag::Webserver => "webserver",
            LogTag::Websocket => "websocket",
            LogTag::Storage => "storage",
            LogTag::Security => "security",
            LogTag::Topics => "topics",
        }
        .to_string()
    }

    /// Uncolored label
    pub fn to_plain_string(&self) -> &'static str {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Config => "CONFIG",
            LogTag::Webserver => "WEBSERVER",
            LogTag::Websocket => "WS",
            LogTag::Storage => "STORAGE",
            LogTag::Security => "SECURITY",
            LogTag::Topics => "TOPICS",
        }
    }

    pub fn all() -> &'static [LogTag] {
        &[
            LogTag::System,
            LogTag::Config,
            LogTag::Webserver,
            LogTag::Websocket,
            LogTag::Storage,
            LogTag::Security,
            LogTag::Topics,
        ]
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_plain_string())
    }
}
