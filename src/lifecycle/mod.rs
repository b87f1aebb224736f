//! Process lifecycle: startup ordering lives in `main`; shutdown
//! coordination lives here.

pub mod shutdown;

pub use shutdown::Shutdown;
