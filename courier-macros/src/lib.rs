//! Procedural macros for Courier.
//!
//! - `#[derive(Message)]` - implements `Message` with an empty lineage
//! - `#[listener]` - implements `Listener` from annotated methods of an impl block

use proc_macro::TokenStream;

mod listener;
mod message;

/// Derive macro for implementing the `Message` trait.
#[proc_macro_derive(Message)]
pub fn derive_message(input: TokenStream) -> TokenStream {
    message::derive_message_impl(input)
}

/// Implements `Listener` for the type of an inherent impl block.
///
/// Methods marked `#[subscribe]` take `&self` and `&Event`; methods marked
/// `#[produce]` take `&self` and return `Option<Event>`. Declarations follow
/// source order.
///
/// ```rust,ignore
/// #[listener]
/// impl Dashboard {
///     #[subscribe]
///     fn on_price(&self, price: &Price) { /* caller's thread */ }
///
///     #[subscribe(main)]
///     fn redraw(&self, price: &Price) { /* host thread */ }
///
///     #[subscribe(background, queue = "audit")]
///     fn audit(&self, price: &Price) -> Result<(), AuditError> { Ok(()) }
///
///     #[produce]
///     fn last_price(&self) -> Option<Price> { None }
/// }
/// ```
#[proc_macro_attribute]
pub fn listener(attr: TokenStream, item: TokenStream) -> TokenStream {
    listener::listener_impl(attr, item)
}
