use crate::models::ClientMembership;

/// Sessions left on a membership, never negative
pub fn remaining_membership_sessions(membership: &ClientMembership) -> i64 {
    (membership.membership.total_sessions - membership.sessions_used).max(0)
}

/// A membership is active while it has sessions left
pub fn is_active_membership(membership: &ClientMembership) -> bool {
    remaining_membership_sessions(membership) > 0
}
