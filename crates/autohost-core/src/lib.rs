pub mod compose;
pub mod config;
pub use config::AutohostConfig;
pub mod corefile;
pub use corefile::{Corefile, CorefileError};
pub mod names;
pub mod os_release;
pub mod report;
pub use report::{Check, Report, Severity, Status};
pub mod template;
