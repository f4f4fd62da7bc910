pub mod replay;
pub mod stub;
pub mod subprocess;

#[cfg(feature = "backend-tract")]
pub mod tract;

pub use replay::ReplayBackend;
pub use stub::{StubBackend, StubPattern};
pub use subprocess::SubprocessBackend;

#[cfg(feature = "backend-tract")]
pub use tract::TractBackend;
