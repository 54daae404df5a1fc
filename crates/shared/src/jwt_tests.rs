//! Unit tests for JWT claims.

#[cfg(test)]
mod tests {
    use crate::auth::Claims;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    #[test]
    fn test_claims_new_sets_correct_fields() {
        let user_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::hours(1);

        let claims = Claims::new(
            user_id,
            org_id,
            "clerk",
            vec!["inventory.stock.view".to_string()],
            expires_at,
        );

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.org, org_id);
        assert_eq!(claims.role, "clerk");
        assert_eq!(claims.permissions, vec!["inventory.stock.view"]);
        assert!(claims.iat <= Utc::now().timestamp());
        assert_eq!(claims.exp, expires_at.timestamp());
    }

    #[test]
    fn test_claims_accessors() {
        let user_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();
        let claims = Claims::new(user_id, org_id, "viewer", vec![], Utc::now());

        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.organization_id(), org_id);
    }

    #[test]
    fn test_claims_without_permissions_field_deserialize() {
        let json = serde_json::json!({
            "sub": Uuid::nil(),
            "org": Uuid::nil(),
            "role": "owner",
            "iat": 0,
            "exp": 1,
        });
        let claims: Claims = serde_json::from_value(json).unwrap();
        assert!(claims.permissions.is_empty());
        assert_eq!(claims.role, "owner");
    }
}
