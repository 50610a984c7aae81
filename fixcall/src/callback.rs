use std::{
    any::type_name,
    fmt::{self, Debug},
    marker::PhantomData,
    ptr::NonNull,
};

use crate::{
    error::{CallbackError, CallbackResult},
    signature::Signature,
    slot::MethodSlot,
};

type MemberCaller<F> = unsafe fn(
    NonNull<()>,
    &MethodSlot,
    <F as Signature>::Args,
) -> <F as Signature>::Output;

type ContextCaller<F> = unsafe fn(
    NonNull<()>,
    &MethodSlot,
    <F as Signature>::Args,
) -> <F as Signature>::Output;

type ContextedMemberCaller<F> = unsafe fn(
    NonNull<()>,
    NonNull<()>,
    &MethodSlot,
    <F as Signature>::Args,
) -> <F as Signature>::Output;

/// Which binding a [`Callback`] currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// Nothing is bound; invoking returns the default value.
    Empty,
    /// A plain function pointer.
    Function,
    /// A function receiving an opaque context before the arguments.
    ContextFunction,
    /// A `&mut self` method bound to an object.
    Member,
    /// A `&mut self` method bound to an object, receiving a context before the
    /// arguments.
    ContextedMember,
}

/// A fixed-size, allocation-free callback slot for the signature `F`.
///
/// `F` is a function pointer type such as `fn(i32) -> i32`. The callback holds
/// at most one binding:
///
/// - a free function ([`Callback::attach`])
/// - a function plus an opaque context ([`Callback::attach_context`])
/// - a method bound to an object ([`Callback::attach_method`])
/// - a method bound to an object plus a context
///   ([`Callback::attach_context_method`])
///
/// Objects and contexts are borrowed, never owned: the callback cannot outlive
/// `'a`. Every binding occupies the same storage, so the size of a `Callback`
/// only depends on `F`.
///
/// ```
/// use fixcall::Callback;
///
/// struct Counter {
///     n: i32,
/// }
///
/// impl Counter {
///     fn bump(&mut self) -> i32 {
///         self.n += 1;
///         self.n
///     }
/// }
///
/// let mut counter = Counter { n: 0 };
/// let mut callback = Callback::<fn() -> i32>::with_method(&mut counter, Counter::bump);
/// assert_eq!(callback.call(), 1);
/// assert_eq!(callback.call(), 2);
///
/// callback.clear();
/// assert!(!callback.valid());
/// assert_eq!(callback.call(), 0);
/// ```
pub struct Callback<'a, F: Signature> {
    function: Option<F>,
    object: Option<NonNull<()>>,
    context: Option<NonNull<()>>,
    /// Type name of the attached context. Kept in release builds as well,
    /// at two words per callback, because `try_context` checks it.
    context_type: Option<&'static str>,
    method: MethodSlot,
    member_caller: Option<MemberCaller<F>>,
    context_fn: Option<ContextCaller<F>>,
    contexted_member_caller: Option<ContextedMemberCaller<F>>,
    _borrow: PhantomData<&'a mut ()>,
}

/// Trampoline for [`BindingKind::Member`].
///
/// # Safety
///
/// `method` must hold a `F::Method<T>` and `object` must point to a live `T`
/// that nothing else accesses during the call.
unsafe fn member_caller<F: Signature, T>(
    object: NonNull<()>,
    method: &MethodSlot,
    args: F::Args,
) -> F::Output {
    let method = method.load::<F::Method<T>>();
    F::call_method(method, object.cast::<T>().as_mut(), args)
}

/// Trampoline for [`BindingKind::ContextFunction`].
///
/// # Safety
///
/// `function` must hold a `F::ContextFn<C>` and `context` must point to a live
/// `C` that nothing else accesses during the call.
unsafe fn context_caller<F: Signature, C>(
    context: NonNull<()>,
    function: &MethodSlot,
    args: F::Args,
) -> F::Output {
    let function = function.load::<F::ContextFn<C>>();
    F::call_with_context(function, context.cast::<C>().as_mut(), args)
}

/// Trampoline for [`BindingKind::ContextedMember`].
///
/// # Safety
///
/// Same as [`member_caller`], plus `context` must point to a live `C` distinct
/// from `object`.
unsafe fn contexted_member_caller<F: Signature, C, T>(
    object: NonNull<()>,
    context: NonNull<()>,
    method: &MethodSlot,
    args: F::Args,
) -> F::Output {
    let method = method.load::<F::ContextMethod<C, T>>();
    F::call_context_method(
        method,
        object.cast::<T>().as_mut(),
        context.cast::<C>().as_mut(),
        args,
    )
}

impl<'a, F: Signature> Callback<'a, F> {
    /// An empty callback. Invoking it returns the default value.
    pub const fn empty() -> Callback<'a, F> {
        Self {
            function: None,
            object: None,
            context: None,
            context_type: None,
            method: MethodSlot::zeroed(),
            member_caller: None,
            context_fn: None,
            contexted_member_caller: None,
            _borrow: PhantomData,
        }
    }

    pub fn new(function: F) -> Callback<'a, F> {
        let mut callback = Self::empty();
        callback.attach(function);
        callback
    }

    pub fn with_context<C>(context: &'a mut C, function: F::ContextFn<C>) -> Callback<'a, F> {
        let mut callback = Self::empty();
        callback.attach_context(context, function);
        callback
    }

    pub fn with_method<T>(object: &'a mut T, method: F::Method<T>) -> Callback<'a, F> {
        let mut callback = Self::empty();
        callback.attach_method(object, method);
        callback
    }

    pub fn with_context_method<C, T>(
        context: &'a mut C,
        object: &'a mut T,
        method: F::ContextMethod<C, T>,
    ) -> Callback<'a, F> {
        let mut callback = Self::empty();
        callback.attach_context_method(context, object, method);
        callback
    }

    /// Bind a free function (or a non-capturing closure).
    pub fn attach(&mut self, function: F) {
        tracing::trace!("Attaching a free function");
        self.reset();
        self.function = Some(function);
    }

    /// Bind `function`, which receives `context` before the call arguments.
    pub fn attach_context<C>(&mut self, context: &'a mut C, function: F::ContextFn<C>) {
        // SAFETY: `context` is exclusively borrowed for `'a`, which outlives
        // `self`.
        unsafe { self.attach_context_ptr::<C>(context, function) }
    }

    /// Bind `method` to `object`.
    pub fn attach_method<T>(&mut self, object: &'a mut T, method: F::Method<T>) {
        // SAFETY: `object` is exclusively borrowed for `'a`, which outlives
        // `self`.
        unsafe { self.attach_method_ptr::<T>(object, method) }
    }

    /// Bind `method` to `object`; the method receives `context` before the call
    /// arguments.
    pub fn attach_context_method<C, T>(
        &mut self,
        context: &'a mut C,
        object: &'a mut T,
        method: F::ContextMethod<C, T>,
    ) {
        // SAFETY: both are exclusively borrowed for `'a`, which outlives `self`,
        // and two exclusive borrows never alias.
        unsafe { self.attach_context_method_ptr::<C, T>(context, object, method) }
    }

    /// Raw-pointer form of [`Callback::attach_context`].
    ///
    /// A null `context` is accepted: the callback stays [`valid`](Self::valid)
    /// but invokes as if it were empty.
    ///
    /// # Safety
    ///
    /// Unless null, `context` must point to a live `C` for as long as the
    /// callback may be invoked, and must not be accessed by anything else while
    /// an invocation is running.
    pub unsafe fn attach_context_ptr<C>(&mut self, context: *mut C, function: F::ContextFn<C>) {
        tracing::trace!("Attaching a context function over `{}`", type_name::<C>());
        self.reset();
        self.set_context(context);
        self.method.store(function);
        self.context_fn = Some(context_caller::<F, C>);
    }

    /// Raw-pointer form of [`Callback::attach_method`].
    ///
    /// A null `object` is accepted: the callback stays [`valid`](Self::valid)
    /// but invokes as if it were empty.
    ///
    /// # Safety
    ///
    /// Unless null, `object` must point to a live `T` for as long as the
    /// callback may be invoked, and must not be accessed by anything else while
    /// an invocation is running.
    pub unsafe fn attach_method_ptr<T>(&mut self, object: *mut T, method: F::Method<T>) {
        tracing::trace!("Attaching a method of `{}`", type_name::<T>());
        self.reset();
        self.object = NonNull::new(object.cast::<()>());
        self.method.store(method);
        self.member_caller = Some(member_caller::<F, T>);
    }

    /// Raw-pointer form of [`Callback::attach_context_method`].
    ///
    /// # Safety
    ///
    /// The requirements of [`Callback::attach_context_ptr`] and
    /// [`Callback::attach_method_ptr`] both apply, and `context` and `object`
    /// must not overlap.
    pub unsafe fn attach_context_method_ptr<C, T>(
        &mut self,
        context: *mut C,
        object: *mut T,
        method: F::ContextMethod<C, T>,
    ) {
        tracing::trace!(
            "Attaching a method of `{}` with a `{}` context",
            type_name::<T>(),
            type_name::<C>()
        );
        self.reset();
        self.set_context(context);
        self.object = NonNull::new(object.cast::<()>());
        self.method.store(method);
        self.contexted_member_caller = Some(contexted_member_caller::<F, C, T>);
    }

    /// Invoke the bound callee, returning `None` if nothing is bound.
    ///
    /// Dispatch checks, in order: contexted member, context function, member,
    /// free function. A dispatcher whose object or context is missing is
    /// skipped.
    pub fn try_invoke(&mut self, args: F::Args) -> Option<F::Output> {
        let method = &self.method;

        if let (Some(caller), Some(context), Some(object)) =
            (self.contexted_member_caller, self.context, self.object)
        {
            // SAFETY: the caller was attached together with `method`, `context`
            // and `object`, whose validity is guaranteed by `'a` or by the
            // contract of the raw attach. `&mut self` rules out re-entrance.
            return Some(unsafe { caller(object, context, method, args) });
        }
        if let (Some(caller), Some(context)) = (self.context_fn, self.context) {
            // SAFETY: see above.
            return Some(unsafe { caller(context, method, args) });
        }
        if let (Some(caller), Some(object)) = (self.member_caller, self.object) {
            // SAFETY: see above.
            return Some(unsafe { caller(object, method, args) });
        }
        if let Some(function) = self.function {
            return Some(F::call(function, args));
        }

        tracing::trace!("Invoking an empty callback");
        None
    }

    /// Invoke the bound callee with the argument tuple `args`.
    ///
    /// Returns the default value of the output type if nothing is bound.
    pub fn invoke(&mut self, args: F::Args) -> F::Output
    where
        F::Output: Default,
    {
        self.try_invoke(args).unwrap_or_default()
    }

    /// The attached context as a `C`, or `None` if no context is attached.
    ///
    /// No type check happens in release builds: asking for a type other than
    /// the attached one yields a pointer that must not be dereferenced.
    ///
    /// # Panics
    ///
    /// In debug builds, if `C` is not the type the context was attached as.
    pub fn context<C>(&self) -> Option<NonNull<C>> {
        debug_assert!(
            self.context.is_none() || self.context_type == Some(type_name::<C>()),
            "context was attached as `{}` but requested as `{}`",
            self.context_type.unwrap_or_default(),
            type_name::<C>()
        );
        self.context.map(NonNull::cast)
    }

    /// Checked form of [`Callback::context`].
    ///
    /// Compares against the type name recorded at attach time. That tag is
    /// stored in every build, so this check also works in release builds.
    ///
    /// # Errors
    ///
    /// [`CallbackError::NoContext`] if no context is attached, and
    /// [`CallbackError::ContextMismatch`] if it was attached as another type.
    pub fn try_context<C>(&self) -> CallbackResult<NonNull<C>> {
        let context = self.context.ok_or(CallbackError::NoContext)?;
        let expected = type_name::<C>();

        match self.context_type {
            Some(found) if found != expected => {
                Err(CallbackError::ContextMismatch { expected, found })
            }
            _ => Ok(context.cast()),
        }
    }

    /// Whether any binding is attached.
    ///
    /// This does not check that the bound object or context is present.
    pub fn valid(&self) -> bool {
        self.contexted_member_caller.is_some()
            || self.context_fn.is_some()
            || self.member_caller.is_some()
            || self.function.is_some()
    }

    pub fn kind(&self) -> BindingKind {
        if self.contexted_member_caller.is_some() {
            BindingKind::ContextedMember
        } else if self.context_fn.is_some() {
            BindingKind::ContextFunction
        } else if self.member_caller.is_some() {
            BindingKind::Member
        } else if self.function.is_some() {
            BindingKind::Function
        } else {
            BindingKind::Empty
        }
    }

    /// Drop the current binding, leaving the callback empty.
    pub fn clear(&mut self) {
        tracing::trace!("Clearing callback");
        self.reset();
    }

    fn reset(&mut self) {
        self.function = None;
        self.object = None;
        self.context = None;
        self.context_type = None;
        self.method.clear();
        self.member_caller = None;
        self.context_fn = None;
        self.contexted_member_caller = None;
    }

    fn set_context<C>(&mut self, context: *mut C) {
        self.context = NonNull::new(context.cast::<()>());
        self.context_type = Some(type_name::<C>());
    }
}

macro_rules! impl_call {
    ($($arg:ident),*) => {
        impl<'a, R: Default, $($arg),*> Callback<'a, fn($($arg),*) -> R> {
            /// Invoke the bound callee with spread arguments.
            ///
            /// Returns `R::default()` if nothing is bound.
            #[allow(non_snake_case)]
            pub fn call(&mut self, $($arg: $arg),*) -> R {
                self.invoke(($($arg,)*))
            }
        }
    };
}

impl_call!();
impl_call!(A);
impl_call!(A, B);
impl_call!(A, B, C);
impl_call!(A, B, C, D);
impl_call!(A, B, C, D, E);
impl_call!(A, B, C, D, E, G);

impl<'a, F: Signature> Default for Callback<'a, F> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a, F: Signature> From<F> for Callback<'a, F> {
    fn from(function: F) -> Self {
        Self::new(function)
    }
}

impl<'a, F: Signature> Debug for Callback<'a, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("kind", &self.kind())
            .field("object", &self.object)
            .field("context", &self.context)
            .field("context_type", &self.context_type)
            .finish_non_exhaustive()
    }
}
