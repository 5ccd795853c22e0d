use crate::backend::GroupProvider;

/// Scope `a:b` authorizes only a user in group `a_b` — colons become
/// underscores. A user is authorized for a scope list only if they belong to
/// every corresponding group.
pub async fn is_authorized_for_scope(
    groups: &dyn GroupProvider,
    user: &str,
    scopes: &[String],
) -> bool {
    let user_groups = groups.get_groups(user).await;
    scopes
        .iter()
        .all(|scope| user_groups.iter().any(|g| g == &scope_group_name(scope)))
}

fn scope_group_name(scope: &str) -> String {
    scope.replace(':', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FakeGroups(Vec<&'static str>);

    #[async_trait]
    impl GroupProvider for FakeGroups {
        async fn get_groups(&self, _user: &str) -> Vec<String> {
            self.0.iter().map(|s| s.to_string()).collect()
        }
    }

    #[tokio::test]
    async fn replaces_colon_with_underscore() {
        assert_eq!(scope_group_name("rs:s"), "rs_s");
        assert_eq!(scope_group_name("rs"), "rs");
    }

    #[tokio::test]
    async fn requires_membership_in_every_scope_group() {
        let groups = FakeGroups(vec!["rs_s"]);
        assert!(is_authorized_for_scope(&groups, "alice", &["rs:s".to_string()]).await);
        assert!(
            !is_authorized_for_scope(
                &groups,
                "alice",
                &["rs:s".to_string(), "rs:t".to_string()]
            )
            .await
        );
    }

    #[tokio::test]
    async fn empty_scope_list_is_trivially_authorized() {
        let groups = FakeGroups(vec![]);
        assert!(is_authorized_for_scope(&groups, "alice", &[]).await);
    }
}
