//! Identifiers the engine matches against and emits.
//!
//! These are fixed: the codemod targets the RxJS 7 migration away from
//! `Observable.prototype.toPromise`, so none of them is configurable.

/// Terminal call converting a stream into a promise
pub const TO_PROMISE: &str = "toPromise";

/// Terminal call registering callbacks on a stream
pub const SUBSCRIBE: &str = "subscribe";

/// Pipeline call name
pub const PIPE: &str = "pipe";

/// Count-limiting operator (`take(1)` qualifies)
pub const TAKE: &str = "take";

/// First-match operator (any `first(...)` qualifies)
pub const FIRST: &str = "first";

/// Limiting operators, in the order the reconciler prunes them
pub const LIMITING_OPERATORS: [&str; 2] = [FIRST, TAKE];

/// Helper resolving with the first emission
pub const FIRST_VALUE_FROM: &str = "firstValueFrom";

/// Helper resolving with the last emission
pub const LAST_VALUE_FROM: &str = "lastValueFrom";

/// Container type used for type assertions
pub const OBSERVABLE: &str = "Observable";

/// Promise continuation used for rewritten subscriptions
pub const THEN: &str = "then";

/// Primary RxJS module
pub const RXJS: &str = "rxjs";

/// RxJS operators submodule
pub const RXJS_OPERATORS: &str = "rxjs/operators";
