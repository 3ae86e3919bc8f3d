//! Algebraic laws of policy composition
//!
//! - AND composition: any member denying makes the set deny, in any order
//! - Purity: repeated evaluation yields the same answer
//! - Truth tables for AuthenticatedOrSafe and OwnerOrSafe

use auth_policy::*;
use http::Method;
use proptest::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug)]
struct Fixed(bool);

impl Policy for Fixed {
    fn name(&self) -> &str {
        if self.0 {
            "fixed_allow"
        } else {
            "fixed_deny"
        }
    }

    fn evaluate_request(&self, _ctx: &RequestContext) -> bool {
        self.0
    }

    fn evaluate_object(&self, _ctx: &RequestContext, _instance: &dyn ResourceInstance) -> bool {
        self.0
    }

    fn restricts_objects(&self) -> bool {
        true
    }
}

struct Owned(Option<Uuid>);

impl ResourceInstance for Owned {
    fn owner_id(&self) -> Option<Uuid> {
        self.0
    }
}

fn method_strategy() -> impl Strategy<Value = Method> {
    prop_oneof![
        Just(Method::GET),
        Just(Method::HEAD),
        Just(Method::OPTIONS),
        Just(Method::POST),
        Just(Method::PUT),
        Just(Method::PATCH),
        Just(Method::DELETE),
    ]
}

fn principal_strategy() -> impl Strategy<Value = Principal> {
    (any::<bool>(), any::<bool>(), any::<u128>()).prop_map(|(authenticated, privileged, id)| {
        if authenticated {
            let principal = Principal::authenticated(Uuid::from_u128(id));
            if privileged {
                principal.privileged()
            } else {
                principal
            }
        } else {
            Principal::anonymous()
        }
    })
}

fn set_of(values: &[bool]) -> PolicySet {
    let members: Vec<PolicyRef> = values
        .iter()
        .map(|v| Arc::new(Fixed(*v)) as PolicyRef)
        .collect();
    PolicySet::new(members).unwrap()
}

proptest! {
    #[test]
    fn and_composition_holds_in_any_order(
        values in prop::collection::vec(any::<bool>(), 1..8),
        rotation in 0usize..8,
        method in method_strategy(),
        principal in principal_strategy(),
    ) {
        let ctx = RequestContext::new(method, principal, Action::Update);
        let expected = values.iter().all(|v| *v);

        let mut rotated = values.clone();
        let len = rotated.len();
        rotated.rotate_left(rotation % len);
        let mut reversed = values.clone();
        reversed.reverse();

        for order in [&values, &rotated, &reversed] {
            let set = set_of(order);
            prop_assert_eq!(set.evaluate_request(&ctx), expected);
            prop_assert_eq!(set.evaluate_object(&ctx, &Owned(None)), expected);
        }
    }

    #[test]
    fn evaluation_is_idempotent(
        method in method_strategy(),
        principal in principal_strategy(),
        owner in proptest::option::of(any::<u128>()),
    ) {
        let set = PolicySet::single(AuthenticatedOrSafe)
            .and(OwnerOrSafe)
            .and(SafeOnlyIfAnonymous);
        let ctx = RequestContext::new(method, principal, Action::Update);
        let instance = Owned(owner.map(Uuid::from_u128));

        prop_assert_eq!(set.check_request(&ctx), set.check_request(&ctx));
        prop_assert_eq!(set.check_object(&ctx, &instance), set.check_object(&ctx, &instance));
    }

    #[test]
    fn authenticated_or_safe_truth_table(
        method in method_strategy(),
        principal in principal_strategy(),
    ) {
        let ctx = RequestContext::new(method.clone(), principal.clone(), Action::List);
        let allowed = AuthenticatedOrSafe.evaluate_request(&ctx);
        if MethodClass::of(&method).is_safe() {
            prop_assert!(allowed);
        } else {
            prop_assert_eq!(allowed, principal.is_authenticated);
        }
    }

    #[test]
    fn owner_or_safe_allows_writes_only_to_owner(
        owner in any::<u128>(),
        other in any::<u128>(),
        method in prop_oneof![Just(Method::POST), Just(Method::PUT), Just(Method::PATCH), Just(Method::DELETE)],
    ) {
        prop_assume!(owner != other);
        let instance = Owned(Some(Uuid::from_u128(owner)));

        let owner_ctx = RequestContext::new(
            method.clone(),
            Principal::authenticated(Uuid::from_u128(owner)),
            Action::Update,
        );
        prop_assert!(OwnerOrSafe.evaluate_object(&owner_ctx, &instance));

        let other_ctx = RequestContext::new(
            method,
            Principal::authenticated(Uuid::from_u128(other)),
            Action::Update,
        );
        prop_assert!(!OwnerOrSafe.evaluate_object(&other_ctx, &instance));
    }
}

#[test]
fn denial_kinds_follow_evaluation_level() {
    use error_common::{Classified, ErrorKind};

    let set = PolicySet::single(Authenticated).and(OwnerOrSafe);
    let anonymous = RequestContext::new(Method::DELETE, Principal::anonymous(), Action::Destroy);
    assert_eq!(set.check_request(&anonymous).unwrap_err().kind(), ErrorKind::Unauthorized);

    let stranger = RequestContext::new(
        Method::DELETE,
        Principal::authenticated(Uuid::new_v4()),
        Action::Destroy,
    );
    let instance = Owned(Some(Uuid::new_v4()));
    assert_eq!(
        set.check_object(&stranger, &instance).unwrap_err().kind(),
        ErrorKind::Forbidden
    );
}
