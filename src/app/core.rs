// core.rs splits the reference application into submodules for easier maintenance.
pub mod chain;
pub mod gas;
pub mod params;
pub mod router;
pub mod state;
pub mod types;
pub mod validation;

pub use chain::*;
pub use gas::GasMeter;
pub use params::*;
pub use router::QueryRouter;
pub use state::*;
pub use types::*;
