//! # Resource Store
//!
//! A resource is a component bound to a fixed set of creation parameters and
//! saved under a name. A *partial resource* (or specialized component) fixes
//! only some of them and can serve as the base for further resources, which
//! store just their own parameters and point at the base via `extends`.
//!
//! ## Record layout
//!
//! Records are pretty-printed JSON, one blob per resource:
//!
//! ```json
//! {
//!     "private": {
//!         "code_uri": "/code/SampleComponent",
//!         "params": { "some_parameter": "abc" },
//!         "resource_creation_params": { "suggested_name": "MyRes", "desc": "..." }
//!     },
//!     "public": { "uri": "/resource/MyRes", "name": "MyRes", "desc": "..." }
//! }
//! ```
//!
//! Plain resources use the [`RESOURCE_EXT`] key extension, partial resources
//! [`PARTIAL_EXT`]. The two namespaces are independent.
//!
//! ## Chain resolution
//!
//! [`ResourceStore::load`] walks `extends` links iteratively. Each base only
//! contributes parameters the record does not already set, so the closest
//! definition wins. The code reference always comes from the end of the chain.

mod definition;
mod store;

pub use definition::{
    creation_contract, specialized_overwrite, CreatedResource, ListingEntry, PrivateDef, PublicDef,
    ResourceDefinition, ResourceDoc, PROVIDED_BY_SPECIALIZATION,
};
pub use store::{name_from_uri, BaseExtension, NameCollision, ResourceStore, PARTIAL_EXT, RESOURCE_EXT};
