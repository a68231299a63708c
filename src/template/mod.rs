//! Template evaluation: path resolution, filters and the evaluator
//!
//! The parser turns a template into flattened text plus a token table; this
//! module turns that pair back into output against a data context.
//!
//! # Example
//!
//! ```text
//! {% for i, post in posts %}
//!   {{ i }}. {{ post.title | truncate(40) | escape }}
//! {% else %}
//!   nothing yet
//! {% endfor %}
//! ```

mod evaluator;
mod filters;
mod pipeline;
mod registry;
mod resolver;

pub use evaluator::{evaluate, Evaluator};
pub use pipeline::{apply_filters, explode_args, split_filter};
pub use registry::{FilterError, FilterFn, FilterRegistry};
pub use resolver::{lookup, resolve};
