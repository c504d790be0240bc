//! Built-in rules

mod amount_outlier;
mod new_device;
mod sanctions;
mod velocity;

pub use amount_outlier::AmountOutlierRule;
pub use new_device::NewDeviceRule;
pub use sanctions::SanctionListRule;
pub use velocity::VelocityRule;
