pub mod store;

pub use store::{parse_env, render_env, validate_entry, EnvMap, EnvStore};
