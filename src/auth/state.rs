//! Authentication state trait and macro.

use super::flow::Authenticator;

/// Trait for state types that provide the authenticator to extractors.
pub trait HasAuthenticator {
    fn authenticator(&self) -> &Authenticator;
}

/// Macro to implement `HasAuthenticator` for state structs with an
/// `auth: Authenticator` field.
///
/// # Example
/// ```ignore
/// use crate::impl_has_authenticator;
///
/// #[derive(Clone)]
/// pub struct MyState {
///     pub auth: Authenticator,
///     // ... other fields
/// }
///
/// impl_has_authenticator!(MyState);
/// ```
#[macro_export]
macro_rules! impl_has_authenticator {
    ($state_type:ty) => {
        impl $crate::auth::HasAuthenticator for $state_type {
            fn authenticator(&self) -> &$crate::auth::Authenticator {
                &self.auth
            }
        }
    };
}
