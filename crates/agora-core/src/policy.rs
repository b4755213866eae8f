use agora_types::models::{Identity, Role};
use tracing::warn;

use crate::error::{PostError, PostResult};

/// Admins may modify anything; everyone else only what they own.
pub fn can_modify(actor_id: &str, actor_role: Role, resource_owner_id: &str) -> bool {
    actor_role == Role::Admin || actor_id == resource_owner_id
}

/// [`can_modify`] for a verified caller, failing with `Forbidden`.
pub fn authorize(actor: &Identity, resource_owner_id: &str) -> PostResult<()> {
    if can_modify(&actor.id, actor.role, resource_owner_id) {
        Ok(())
    } else {
        warn!(
            actor = %actor.id,
            owner = %resource_owner_id,
            "Rejected modification by non-owner"
        );
        Err(PostError::Forbidden)
    }
}
