// Module declarations for `core`.
//
// `config` module:
// Defines `CompareConfig`, the `Mode`/`Pass` selectors and the
// `ConfigManager` that reads and writes the TOML run configuration.
pub mod config;

// `engine` module:
// Drives a run: resolves passes, builds the target structures once per pass
// and fans the per-source tasks out over the worker pool.
pub mod engine;

// `error` module:
// The typed `CompareError` shared by the library layer.
pub mod error;

// `tasks` module:
// One `SourceTask` per comparison kind; each reads one source file and
// writes that file's reports.
pub mod tasks;
