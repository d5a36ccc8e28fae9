use crate::models::UserProfile;
use crate::roles::Role;

/// Authentication state observed by the UI.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthState {
    /// A restore or sign-in is in flight.
    pub is_loading: bool,
    /// The identity provider vouched for the user.
    pub is_authenticated: bool,
    /// The backend knows the user and a full session exists.
    pub is_registered: bool,
    /// Classified role, once registered.
    pub role: Option<Role>,
    /// Approval flag from the profile.
    pub is_approved: bool,
    /// Current profile.
    pub user: Option<UserProfile>,
}

impl AuthState {
    /// State on boot, before the stored session was looked at.
    pub fn initial() -> Self {
        Self {
            is_loading: true,
            ..Self::signed_out()
        }
    }

    /// Nobody signed in, nothing in flight.
    pub fn signed_out() -> Self {
        Self {
            is_loading: false,
            is_authenticated: false,
            is_registered: false,
            role: None,
            is_approved: false,
            user: None,
        }
    }

    /// Fully signed in as `user` with `role`.
    pub fn registered(user: UserProfile, role: Role) -> Self {
        Self {
            is_loading: false,
            is_authenticated: true,
            is_registered: true,
            role: Some(role),
            is_approved: user.is_approved(),
            user: Some(user),
        }
    }

    /// Signed in with the identity provider but unknown to the backend.
    pub fn awaiting_registration() -> Self {
        Self {
            is_authenticated: true,
            ..Self::signed_out()
        }
    }

    /// True for administrators.
    pub fn is_admin(&self) -> bool {
        self.role.is_some_and(|r| r.is_admin())
    }

    /// True for venue owners.
    pub fn is_bar_owner(&self) -> bool {
        self.role.is_some_and(|r| r.is_venue_owner())
    }

    /// Id of the current user.
    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.id)
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::initial()
    }
}
