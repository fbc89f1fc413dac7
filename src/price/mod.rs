pub mod diagnostics;
pub mod normalize;
pub mod resolver;
pub mod rules;

pub use diagnostics::{Diagnostics, Silent, TraceLog};
pub use resolver::PriceResolver;
pub use rules::RuleSet;
