// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) wires these modules into the interactive client.
//
// Module responsibilities:
// - `config`: TOML configuration and base-URL validation.
// - `domain`: typed records built from the service's row/object responses.
// - `api`: blocking HTTP client, bounded-retry fetcher, per-endpoint calls.
// - `storage`: retrieval of result files from the object-store bucket.
// - `ui`: the interactive command loop and per-command handlers.

pub mod api;
pub mod config;
pub mod domain;
pub mod storage;
pub mod ui;
