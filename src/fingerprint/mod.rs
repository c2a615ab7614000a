pub mod deriver;
pub mod hash;
pub mod insights;
pub mod types;

pub use deriver::{derive_fingerprint, FingerprintDeriver};
pub use insights::{DerivedInsights, IncomeEstimate, Lifestyle, TechSavviness, Urbanity};
pub use types::{Fingerprint, FINGERPRINT_VERSION};
