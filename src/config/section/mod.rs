//! Configuration section definitions.
//!
//! Each module corresponds to one or more sections in `wttp.toml`:
//!
//! | Module    | TOML Section                         | Purpose                       |
//! |-----------|--------------------------------------|-------------------------------|
//! | `source`  | `[source]`, `[build]`                | Source scan and build output  |
//! | `store`   | `[store]`, `[pinning]`, `[strategy]` | Remote services and strategy  |
//! | `stages`  | `[stages.*]`                         | External commands             |
//! | `network` | `[network]`, `[report]`              | Target network, report file   |

mod network;
mod source;
mod stages;
mod store;

pub use network::{NetworkConfig, ReportConfig};
pub use source::{BuildConfig, SourceConfig};
pub use stages::{StageConfig, StagesConfig};
pub use store::{PinningConfig, StoreConfig, StrategyConfig};
