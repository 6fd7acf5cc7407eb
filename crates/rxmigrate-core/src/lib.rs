//! rxmigrate core: the `toPromise()` rewrite engine
//!
//! Rewrites RxJS `toPromise()` chains (and one-shot `subscribe` calls) into
//! `firstValueFrom` / `lastValueFrom`, then fixes up the file's imports.
//!
//! # Pipeline
//!
//! ```text
//! source → SyntaxParser → locate_sites → classify → plan_site ─┐
//!                                                              ▼
//!            output ← reconcile (imports) ← reparse ← render (RequiredImports)
//! ```
//!
//! | Input                                     | Output                               |
//! |-------------------------------------------|--------------------------------------|
//! | `src.pipe(take(1)).toPromise()`           | `firstValueFrom(src)`                |
//! | `src.pipe(map(f), first()).toPromise()`   | `firstValueFrom(src.pipe(map(f)))`   |
//! | `src.toPromise()`                         | `lastValueFrom(src)`                 |
//! | `src.toPromise<T>()`                      | `lastValueFrom(src as Observable<T>)`|
//! | `src.pipe(take(1)).subscribe(cb)`         | `firstValueFrom(src).then(cb)`       |
//!
//! # Example
//!
//! ```rust
//! use rxmigrate_core::{transform, FileInfo, TransformOutcome};
//!
//! let out = transform("const u = user$.toPromise();\n", &FileInfo::new("user.ts"))?;
//! assert_eq!(
//!     out.source(),
//!     Some("import { lastValueFrom } from \"rxjs\";\nconst u = lastValueFrom(user$);\n")
//! );
//! # Ok::<(), rxmigrate_core::TransformError>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod classify;
pub mod error;
pub mod imports;
pub mod locate;
pub mod rewrite;
pub mod syntax;
pub mod transform;
pub mod vocab;

// Re-exports for convenience
pub use error::{TransformError, TransformResult};
pub use syntax::{Dialect, FileInfo, SyntaxParser};
pub use transform::{transform, TransformOutcome, TransformStats, Transformer};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
