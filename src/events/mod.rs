//! In-process event distribution.
//!
//! The realtime manager republishes every decoded frame through an
//! [`EventBus`]. The bus is a standalone component and can be used on its
//! own with any cloneable payload type.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `bus` | Named-channel publish/subscribe bus |

// ============================================================================
// Submodules
// ============================================================================

/// Named-channel publish/subscribe bus.
pub mod bus;

// ============================================================================
// Re-exports
// ============================================================================

pub use bus::{Callback, EventBus};
