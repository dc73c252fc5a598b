pub use mcfunction_toolchain_diagnostics::{Diagnostic, LineIndex, Severity, Span, codes};
