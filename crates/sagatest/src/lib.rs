pub mod diagnostics;
pub mod error;
pub mod expect_saga;
pub mod expectation;
pub mod logging;
pub mod report;

pub use diagnostics::{AnsiDiagnostics, Diagnostics, PlainDiagnostics};
pub use error::{ExpectError, Failure};
pub use expect_saga::{expect_saga, ExpectSaga};
pub use expectation::{EffectPattern, ErrorMatcher, Expectation, ExpectationEngine};
pub use report::report_actual_effects;
