//! Solving engines and the protocol they share
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod adversarial;
pub mod csp;
pub mod path_finding;
pub mod presets;
pub mod traits;

pub use self::adversarial::*;
pub use self::csp::*;
pub use self::path_finding::*;
pub use self::traits::*;
