//! Procedural macros for hutshim services
//!
//! # `#[method]`
//!
//! Turns an ordinary async function with typed positional parameters into a
//! factory returning `Box<dyn hutshim_runner::Method>`, ready to be added to
//! an `Interface`:
//!
//! ```ignore
//! use hutshim_core::ServiceError;
//! use hutshim_runner::{Context, Interface};
//! use hutshim_macros::method;
//!
//! #[method]
//! async fn add(x: i64, y: i64) -> Result<i64, ServiceError> {
//!     Ok(x + y)
//! }
//!
//! #[method]
//! async fn upload(ctx: Context, fname: String) -> Result<serde_json::Value, hutshim_core::MethodError> {
//!     Ok(ctx.client().put_file(&fname).await?)
//! }
//!
//! let iface = Interface::new("Default")
//!     .method("add", add())
//!     .method("upload", upload());
//! ```
//!
//! The request's `params` array is decoded into the parameters in order; a
//! wrong count or type becomes an application error (`-32602`). A first
//! parameter typed `Context` receives the request context and does not count
//! as a positional parameter.
//!
//! # Limitations
//!
//! - Only `async fn`, without generics or `self`
//! - Parameters must be owned, deserializable types
//! - The return type must be `Result<T, E>` with `T: Serialize` and
//!   `E: Into<MethodError>`
//! - Generated code names `hutshim_runner` directly, so that crate must be a
//!   dependency of the caller

mod method;

use proc_macro::TokenStream;

/// Define a service method from an async function
///
/// See the [crate documentation](crate) for the generated shape.
#[proc_macro_attribute]
pub fn method(attr: TokenStream, item: TokenStream) -> TokenStream {
    match method::method_impl(attr.into(), item.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
