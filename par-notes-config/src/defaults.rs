//! Default value functions for configuration.
//!
//! Used as `#[serde(default = "crate::defaults::...")]` attributes on
//! `Config` fields so partially written files still load.

// ── Primitive helpers ──────────────────────────────────────────────────────

pub fn bool_false() -> bool {
    false
}

pub fn bool_true() -> bool {
    true
}

// ── Sync ───────────────────────────────────────────────────────────────────

pub fn server_url() -> String {
    "http://localhost:8080".to_string()
}

pub fn sync_debounce_ms() -> u64 {
    1000
}

pub fn sync_timeout_secs() -> u64 {
    10
}

// ── Tree ───────────────────────────────────────────────────────────────────

pub fn title_prefix() -> String {
    "Note ".to_string()
}

pub fn root_label() -> String {
    "Root".to_string()
}
