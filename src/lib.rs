//! # The store pattern
//! Vulkan objects depend on each other in long chains (entry -> instance ->
//! physical device -> device -> queues -> swapchain). Instead of threading
//! concrete types through every layer, dependents ask a store trait for the
//! handles they need and stay agnostic of who owns them. Anything that holds
//! an `ash::Instance` can back a `Device`, anything that acts like a
//! `DeviceStore` can back a render target.

pub mod gfx;
pub mod gui;
pub mod init;
pub mod version;

use version::SemanticVersion;

/// Version advertised to Vulkan as the engine version.
pub const LIBRARY_VERSION: SemanticVersion = SemanticVersion::new(0, 1, 0);
