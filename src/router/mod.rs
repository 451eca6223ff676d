//! # Router Module
//!
//! Maps a request path to one of the engine's top-level categories by
//! matching configurable URL prefixes:
//!
//! | Prefix (default) | Category      | Handled by                          |
//! |------------------|---------------|-------------------------------------|
//! | `/` and `/meta`  | Meta          | server metadata                     |
//! | `/code`          | Code          | component catalog and creation      |
//! | `/specialized`   | Specialized   | partial resources                   |
//! | `/resource`      | Resource      | resources and service invocation    |
//! | `/static`        | Static        | files from the static directory     |
//!
//! The longest matching prefix wins, and a prefix only matches at a segment
//! boundary (`/resources` does not match `/resource`). The rest of the path
//! is split into percent-decoded segments. Unmatched paths are `404`.
//!
//! ```rust
//! use resx::config::Prefixes;
//! use resx::router::{PrefixRouter, RouteCategory};
//!
//! let router = PrefixRouter::new(&Prefixes::default());
//! let m = router.match_path("/resource/MyRes/entries/42").unwrap();
//! assert_eq!(m.category, RouteCategory::Resource);
//! assert_eq!(m.segments.as_slice(), ["MyRes", "entries", "42"]);
//! ```

mod core;

pub use core::{PrefixRouter, RouteCategory, RouteMatch, SegmentVec, MAX_INLINE_SEGMENTS};
