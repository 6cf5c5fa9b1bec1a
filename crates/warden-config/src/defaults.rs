//! Default configuration values.

pub fn default_listen() -> String {
    // Loopback by default: the proxy server and this control plane share a
    // host; exposing the auth endpoint publicly is an explicit choice.
    "127.0.0.1:28262".to_string()
}

pub fn default_registry_path() -> String {
    "users.json".to_string()
}

pub fn default_reload_interval_secs() -> u64 {
    5
}

pub fn default_flush_interval_secs() -> u64 {
    5
}

pub fn default_flush_max_pending() -> usize {
    256
}

pub fn default_io_timeout_secs() -> u64 {
    5
}

pub fn default_on_corrupt() -> String {
    "empty".to_string()
}
