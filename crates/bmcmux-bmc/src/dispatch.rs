//! Capability dispatcher
//!
//! Filters a set of registered providers down to the ones implementing a
//! capability, keeping their order and tagging each with its name.

use crate::capability::Capability;
use crate::error::{BmcError, MultiError};
use crate::provider::RegisteredProvider;

/// A provider selected for one capability
pub struct Candidate<'a, C: Capability + ?Sized> {
    /// Resolved provider name
    pub name: &'a str,
    /// The provider's implementation of `C`
    pub handle: C::Handle<'a>,
}

/// Outcome of dispatch: the candidates, or why there are none
pub type Dispatched<'a, C> = std::result::Result<Vec<Candidate<'a, C>>, MultiError>;

/// Split providers into those implementing `C` and one error per rejected value
pub fn filter<'a, C: Capability + ?Sized>(
    providers: &'a [RegisteredProvider],
) -> (Vec<Candidate<'a, C>>, MultiError) {
    let mut candidates = Vec::with_capacity(providers.len());
    let mut rejected = MultiError::new();

    for registered in providers {
        match C::resolve(registered.provider()) {
            Some(handle) => candidates.push(Candidate {
                name: registered.name(),
                handle,
            }),
            None => rejected.push(BmcError::NotImplemented {
                capability: C::NAME,
                type_name: registered.type_name().to_string(),
            }),
        }
    }

    (candidates, rejected)
}

/// Providers implementing `C`, in input order
///
/// Rejections are dropped when at least one provider matches. When none
/// does, the error lists every rejection followed by
/// "no `C` implementations found".
pub fn dispatch<'a, C: Capability + ?Sized>(providers: &'a [RegisteredProvider]) -> Dispatched<'a, C> {
    let (candidates, rejected) = filter::<C>(providers);
    if candidates.is_empty() {
        return Err(rejected.with(BmcError::NoImplementations { capability: C::NAME }));
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::ops::power::{PowerSetter, PowerStateGetter};
    use crate::testing::{Behavior, ScriptedProvider};

    fn providers() -> Vec<RegisteredProvider> {
        vec![
            RegisteredProvider::new(
                ScriptedProvider::new("a").script::<dyn PowerSetter>(Behavior::Succeed),
            ),
            RegisteredProvider::new(
                ScriptedProvider::new("b").script::<dyn PowerStateGetter>(Behavior::Succeed),
            ),
            RegisteredProvider::new(
                ScriptedProvider::new("c").script::<dyn PowerSetter>(Behavior::Succeed),
            ),
        ]
    }

    #[test]
    fn test_dispatch_keeps_input_order() {
        let providers = providers();
        let candidates = dispatch::<dyn PowerSetter>(&providers).unwrap();

        let names: Vec<&str> = candidates.iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_filter_reports_each_rejection() {
        let providers = providers();
        let (candidates, rejected) = filter::<dyn PowerStateGetter>(&providers);

        assert_eq!(candidates.len(), 1);
        assert_eq!(rejected.len(), 2);
        assert!(rejected.errors().iter().all(|e| e
            .to_string()
            .starts_with("not a PowerStateGetter implementation: ")));
        assert!(rejected.to_string().contains("ScriptedProvider"));
    }

    #[test]
    fn test_dispatch_no_implementations() {
        let providers = vec![
            RegisteredProvider::new(ScriptedProvider::new("x")),
            RegisteredProvider::new(ScriptedProvider::new("y")),
        ];

        let err = match dispatch::<dyn PowerSetter>(&providers) {
            Ok(_) => panic!("expected dispatch to fail"),
            Err(e) => e,
        };

        assert_eq!(err.len(), 3);
        assert!(err.is(ErrorKind::NoCompatibleProvider));
        assert_eq!(
            err.summary().map(|e| e.to_string()),
            Some("no PowerSetter implementations found".to_string())
        );
    }

    #[test]
    fn test_dispatch_empty_input() {
        let err = match dispatch::<dyn PowerSetter>(&[]) {
            Ok(_) => panic!("expected dispatch to fail"),
            Err(e) => e,
        };
        assert_eq!(err.to_string(), "no PowerSetter implementations found");
    }
}
