#![deny(
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
    rustdoc::missing_crate_level_docs,
    rustdoc::invalid_codeblock_attributes,
    rustdoc::bare_urls
)]
#![doc = include_str!("../README.md")]
//! # A Note on Matching Order
//!
//! Templates with the same number of separators are merged into a shared tree,
//! so the engine walks a common prefix like `/customer/` exactly once even if
//! dozens of templates start with it. Within that tree, templates are tried in
//! registration order. Templates containing `/**` or `{*name}` can match paths
//! with any number of separators and are kept aside from the fixed-length
//! trees; they are always tried after the fixed-length candidates.

mod compile;
mod errors;
pub use errors::*;
mod matcher;
pub use matcher::*;
mod prepare;
mod result;
pub use result::*;
mod segment;
mod template;
pub use template::*;
mod tree;
