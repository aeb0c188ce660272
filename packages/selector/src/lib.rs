#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Single-slot memoized selectors.
//!
//! A selector derives a value from explicit `(state, props)` arguments.
//! Input selectors read a shared value straight out of the state; memoized
//! selectors combine the outputs of other selectors with a result function
//! and remember the last input tuple they saw. When every input comes back
//! as the *same* [`Arc`] as last time, the cached output is returned and the
//! result function is not called.
//!
//! Each memoized selector holds exactly one cache slot. A selector shared
//! between call sites that pass different props will recompute on every
//! alternation, so build one selector instance per call site.
//!
//! ```
//! use std::sync::Arc;
//!
//! use crash_map_selector::{Select as _, create_selector, input};
//!
//! struct State {
//!     values: Arc<Vec<u64>>,
//! }
//!
//! let values = input(|state: &State, _props: &()| Arc::clone(&state.values));
//! let total = create_selector!(values => |values: &Vec<u64>| values.iter().sum::<u64>());
//!
//! let state = State { values: Arc::new(vec![1, 2, 3]) };
//! assert_eq!(*total.select(&state, &()), 6);
//! assert_eq!(*total.select(&state, &()), 6);
//! assert_eq!(total.recomputations(), 1);
//! ```

use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Something that derives a shared value from `(state, props)`.
pub trait Select<S: ?Sized, P: ?Sized> {
    /// The derived value.
    type Output;

    /// Derives the value. Returning the same [`Arc`] for unchanged inputs is
    /// what lets downstream selectors skip recomputation.
    fn select(&self, state: &S, props: &P) -> Arc<Self::Output>;
}

impl<S: ?Sized, P: ?Sized, T: Select<S, P> + ?Sized> Select<S, P> for Arc<T> {
    type Output = T::Output;

    fn select(&self, state: &S, props: &P) -> Arc<Self::Output> {
        (**self).select(state, props)
    }
}

impl<S: ?Sized, P: ?Sized, T: Select<S, P> + ?Sized> Select<S, P> for Box<T> {
    type Output = T::Output;

    fn select(&self, state: &S, props: &P) -> Arc<Self::Output> {
        (**self).select(state, props)
    }
}

/// A type-erased selector, convenient for storing selectors in structs.
pub type SharedSelector<S, P, O> = Arc<dyn Select<S, P, Output = O> + Send + Sync>;

/// A non-memoized selector that reads a value out of the state or props.
pub struct InputSelector<F>(F);

/// Wraps an accessor closure as an input selector.
///
/// The accessor should hand back an existing [`Arc`] (via [`Arc::clone`])
/// rather than allocating a new one, otherwise every downstream selector
/// recomputes on every call.
#[must_use]
pub const fn input<F>(accessor: F) -> InputSelector<F> {
    InputSelector(accessor)
}

impl<S: ?Sized, P: ?Sized, T, F> Select<S, P> for InputSelector<F>
where
    F: Fn(&S, &P) -> Arc<T>,
{
    type Output = T;

    fn select(&self, state: &S, props: &P) -> Arc<T> {
        (self.0)(state, props)
    }
}

struct Slot<V, O> {
    inputs: V,
    output: Arc<O>,
}

macro_rules! memoized_selector {
    (
        $(#[$meta:meta])*
        $name:ident, $create:ident;
        $($input:ident $arg:ident $idx:tt),+
    ) => {
        $(#[$meta])*
        pub struct $name<S: ?Sized, P: ?Sized, $($input: Select<S, P>,)+ F, O> {
            inputs: ($($input,)+),
            result: F,
            slot: Mutex<Option<Slot<($(Arc<$input::Output>,)+), O>>>,
            recomputations: AtomicUsize,
            _state: PhantomData<fn(&S, &P)>,
        }

        impl<S: ?Sized, P: ?Sized, $($input: Select<S, P>,)+ F, O> $name<S, P, $($input,)+ F, O> {
            /// Number of times the result function has run.
            pub fn recomputations(&self) -> usize {
                self.recomputations.load(Ordering::Relaxed)
            }

            /// Resets the recomputation counter to zero.
            pub fn reset_recomputations(&self) {
                self.recomputations.store(0, Ordering::Relaxed);
            }
        }

        impl<S: ?Sized, P: ?Sized, $($input: Select<S, P>,)+ F, O> Select<S, P>
            for $name<S, P, $($input,)+ F, O>
        where
            F: Fn($(&$input::Output),+) -> O,
        {
            type Output = O;

            fn select(&self, state: &S, props: &P) -> Arc<O> {
                let values = ($(self.inputs.$idx.select(state, props),)+);

                let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(cached) = slot.as_ref()
                    && $(Arc::ptr_eq(&cached.inputs.$idx, &values.$idx))&&+
                {
                    log::trace!("{}: cache hit", stringify!($name));
                    return Arc::clone(&cached.output);
                }

                log::trace!("{}: recomputing", stringify!($name));
                let output = Arc::new((self.result)($(&*values.$idx),+));
                self.recomputations.fetch_add(1, Ordering::Relaxed);
                *slot = Some(Slot {
                    inputs: values,
                    output: Arc::clone(&output),
                });
                output
            }
        }

        /// Builds a memoized selector over the given input selectors.
        pub fn $create<S: ?Sized, P: ?Sized, $($input,)+ F, O>(
            $($arg: $input,)+
            result: F,
        ) -> $name<S, P, $($input,)+ F, O>
        where
            $($input: Select<S, P>,)+
            F: Fn($(&$input::Output),+) -> O,
        {
            $name {
                inputs: ($($arg,)+),
                result,
                slot: Mutex::new(None),
                recomputations: AtomicUsize::new(0),
                _state: PhantomData,
            }
        }
    };
}

memoized_selector!(
    /// A memoized selector with one input.
    Selector1, create_selector1;
    A a 0
);

memoized_selector!(
    /// A memoized selector with two inputs.
    Selector2, create_selector2;
    A a 0, B b 1
);

memoized_selector!(
    /// A memoized selector with three inputs.
    Selector3, create_selector3;
    A a 0, B b 1, C c 2
);

memoized_selector!(
    /// A memoized selector with four inputs.
    Selector4, create_selector4;
    A a 0, B b 1, C c 2, D d 3
);

/// Builds a memoized selector from one to four input selectors and a
/// result function: `create_selector!(a, b => |a, b| ...)`.
#[macro_export]
macro_rules! create_selector {
    ($a:expr => $result:expr) => {
        $crate::create_selector1($a, $result)
    };
    ($a:expr, $b:expr => $result:expr) => {
        $crate::create_selector2($a, $b, $result)
    };
    ($a:expr, $b:expr, $c:expr => $result:expr) => {
        $crate::create_selector3($a, $b, $c, $result)
    };
    ($a:expr, $b:expr, $c:expr, $d:expr => $result:expr) => {
        $crate::create_selector4($a, $b, $c, $d, $result)
    };
}
