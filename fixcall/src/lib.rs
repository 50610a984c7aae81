#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::borrow_as_ptr)]

//! A fixed-size, allocation-free callback slot.
//!
//! [`Callback`] stores a free function, a function plus an opaque context, a
//! method bound to an object, or a bound method plus a context, all in the
//! same fixed layout. The caller invokes it without knowing which one was
//! stored.

mod callback;
mod error;
mod signature;
mod slot;

pub use self::{
    callback::{BindingKind, Callback},
    error::{CallbackError, CallbackResult},
    signature::Signature,
    slot::METHOD_SLOT_WORDS,
};
