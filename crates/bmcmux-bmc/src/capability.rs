//! Binding between capability traits and provider accessors
//!
//! Each capability trait object type (`dyn PowerSetter`, `dyn Opener`, ...)
//! implements [`Capability`], which tells the dispatcher the capability's
//! display name and how to ask a [`Provider`] for it. The check happens
//! through the provider's own `as_*` accessor, so no runtime type inspection
//! is involved.

use crate::provider::Provider;

/// A capability that providers may implement
pub trait Capability {
    /// Display name used in errors ("no PowerSetter implementations found")
    const NAME: &'static str;

    /// Typed handle borrowed from a provider
    type Handle<'p>;

    /// The provider's implementation of this capability, if it has one
    fn resolve(provider: &dyn Provider) -> Option<Self::Handle<'_>>;
}

/// Implement [`Capability`] for a capability trait object
///
/// `capability!(PowerSetter, as_power_setter);`
macro_rules! capability {
    ($capability:ident, $accessor:ident) => {
        impl $crate::capability::Capability for dyn $capability {
            const NAME: &'static str = stringify!($capability);

            type Handle<'p> = &'p dyn $capability;

            fn resolve(
                provider: &dyn $crate::provider::Provider,
            ) -> Option<Self::Handle<'_>> {
                provider.$accessor()
            }
        }
    };
}

pub(crate) use capability;
