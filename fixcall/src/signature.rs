//! Call signatures a [`Callback`](crate::Callback) can be parameterized with.
//!
//! A signature is named by a plain function pointer type, e.g. `fn(i32) -> i32`.
//! Every binding shape derives its own function pointer type from it.

/// A call signature `fn(A, B, ..) -> R` with up to six arguments.
///
/// The associated function pointer types describe the shape a callee must have
/// for each kind of binding:
///
/// - [`ContextFn<C>`](Signature::ContextFn): `fn(&mut C, A, B, ..) -> R`
/// - [`Method<T>`](Signature::Method): `fn(&mut T, A, B, ..) -> R`, which is what
///   a `&mut self` method path such as `Counter::bump` coerces to
/// - [`ContextMethod<C, T>`](Signature::ContextMethod): `fn(&mut T, &mut C, A, B, ..) -> R`
pub trait Signature: Copy {
    /// The arguments packed as a tuple.
    type Args;
    type Output;

    type ContextFn<C>: Copy;
    type Method<T>: Copy;
    type ContextMethod<C, T>: Copy;

    fn call(self, args: Self::Args) -> Self::Output;

    fn call_with_context<C>(function: Self::ContextFn<C>, context: &mut C, args: Self::Args)
        -> Self::Output;

    fn call_method<T>(method: Self::Method<T>, object: &mut T, args: Self::Args) -> Self::Output;

    fn call_context_method<C, T>(
        method: Self::ContextMethod<C, T>,
        object: &mut T,
        context: &mut C,
        args: Self::Args,
    ) -> Self::Output;
}

macro_rules! impl_signature {
    ($($arg:ident),*) => {
        impl<R, $($arg),*> Signature for fn($($arg),*) -> R {
            type Args = ($($arg,)*);
            type Output = R;

            type ContextFn<C> = fn(&mut C, $($arg),*) -> R;
            type Method<T> = fn(&mut T, $($arg),*) -> R;
            type ContextMethod<C, T> = fn(&mut T, &mut C, $($arg),*) -> R;

            #[allow(non_snake_case)]
            fn call(self, ($($arg,)*): Self::Args) -> R {
                self($($arg),*)
            }

            #[allow(non_snake_case)]
            fn call_with_context<C>(
                function: Self::ContextFn<C>,
                context: &mut C,
                ($($arg,)*): Self::Args,
            ) -> R {
                function(context, $($arg),*)
            }

            #[allow(non_snake_case)]
            fn call_method<T>(method: Self::Method<T>, object: &mut T, ($($arg,)*): Self::Args) -> R {
                method(object, $($arg),*)
            }

            #[allow(non_snake_case)]
            fn call_context_method<C, T>(
                method: Self::ContextMethod<C, T>,
                object: &mut T,
                context: &mut C,
                ($($arg,)*): Self::Args,
            ) -> R {
                method(object, context, $($arg),*)
            }
        }
    };
}

impl_signature!();
impl_signature!(A);
impl_signature!(A, B);
impl_signature!(A, B, C0);
impl_signature!(A, B, C0, D);
impl_signature!(A, B, C0, D, E);
impl_signature!(A, B, C0, D, E, G);
