use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use prodflow_client::{NewUser, ResourceCache, Role, User, UserPatch};
use uuid::Uuid;

use crate::cli::{ListArgs, OutputFormat, UserCreateArgs, UserUpdateArgs};
use crate::output::{print_structured, print_success, users_table};

pub async fn list(cache: &ResourceCache, args: &ListArgs, format: OutputFormat) -> Result<()> {
    let users = match &args.name {
        Some(query) => Arc::new(cache.client().search::<User>(query).await?),
        None => cache.read::<User>().await?,
    };
    match format {
        OutputFormat::Table => {
            let roles = roles_for_display(cache).await;
            println!("{}", users_table(&users, &roles));
        }
        _ => print_structured(&*users, format)?,
    }
    Ok(())
}

pub async fn get(cache: &ResourceCache, id: Uuid, format: OutputFormat) -> Result<()> {
    let user = cache.client().get::<User>(id).await?;
    match format {
        OutputFormat::Table => {
            let roles = roles_for_display(cache).await;
            println!("{}", users_table(std::slice::from_ref(&user), &roles));
        }
        _ => print_structured(&user, format)?,
    }
    Ok(())
}

/// Roles used to name a user's role ids. Without access to roles the ids are shown raw.
async fn roles_for_display(cache: &ResourceCache) -> Arc<Vec<Role>> {
    match cache.read::<Role>().await {
        Ok(roles) => roles,
        Err(e) => {
            tracing::warn!(error = %e, "cannot read roles, showing raw role ids");
            Arc::default()
        }
    }
}

pub async fn create(cache: &ResourceCache, args: &UserCreateArgs, format: OutputFormat) -> Result<()> {
    let payload = NewUser {
        username: args.username.clone(),
        first_name: args.first_name.clone(),
        last_name: args.last_name.clone(),
        patronymic: args.patronymic.clone(),
        password: args.password.clone(),
        finger_token: args.finger_token.clone(),
        role_ids: args.roles.clone(),
    };
    let created = cache.create::<User>(&payload).await?;
    print_success(&format!(
        "Created user {} ({})",
        created.username.cyan(),
        created.id
    ));
    list(cache, &ListArgs::default(), format).await
}

pub async fn update(cache: &ResourceCache, args: &UserUpdateArgs, format: OutputFormat) -> Result<()> {
    let patch = patch_from_args(args);
    if patch == UserPatch::default() {
        anyhow::bail!("Nothing to update. Pass at least one field to change");
    }
    let updated = cache.update::<User>(args.id, &patch).await?;
    print_success(&format!("Updated user {}", updated.username.cyan()));
    list(cache, &ListArgs::default(), format).await
}

pub async fn delete(cache: &ResourceCache, id: Uuid, format: OutputFormat) -> Result<()> {
    cache.delete::<User>(id).await?;
    print_success(&format!("Deleted user {id}"));
    list(cache, &ListArgs::default(), format).await
}

fn patch_from_args(args: &UserUpdateArgs) -> UserPatch {
    let role_ids = if args.clear_roles {
        Some(Vec::new())
    } else if args.roles.is_empty() {
        None
    } else {
        Some(args.roles.clone())
    };
    UserPatch {
        username: args.username.clone(),
        first_name: args.first_name.clone(),
        last_name: args.last_name.clone(),
        patronymic: args.patronymic.clone(),
        password: args.password.clone(),
        finger_token: args.finger_token.clone(),
        role_ids,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prodflow_client::{ApiClient, ClientError};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ADMIN_ROLE: &str = "0b7f2b0e-8d7e-4d7c-9a55-3f1f7b2f9a01";

    async fn server_without_role_access() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "9e2a6c1b-7d3f-4a8e-b5c4-1f0d2e3a4b03",
                "username": "ivanov",
                "first_name": "Ivan",
                "last_name": "Ivanov",
                "role_ids": [ADMIN_ROLE]
            }])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/roles"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({ "detail": "Not enough permissions" })),
            )
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_users_table_survives_forbidden_roles() {
        let server = server_without_role_access().await;
        let cache = ResourceCache::with_defaults(ApiClient::new(&server.uri(), None).unwrap());

        assert!(roles_for_display(&cache).await.is_empty());
        assert!(matches!(
            cache.read::<Role>().await,
            Err(ClientError::Http { status: 403, .. })
        ));

        let users = cache.read::<User>().await.unwrap();
        let table = users_table(&users, &roles_for_display(&cache).await);
        assert!(table.contains("ivanov"));
        assert!(table.contains(ADMIN_ROLE));

        list(&cache, &ListArgs::default(), OutputFormat::Table)
            .await
            .unwrap();
    }

    fn args(id: Uuid) -> UserUpdateArgs {
        UserUpdateArgs {
            id,
            username: None,
            first_name: None,
            last_name: None,
            patronymic: None,
            password: None,
            finger_token: None,
            roles: Vec::new(),
            clear_roles: false,
        }
    }

    #[test]
    fn test_patch_leaves_roles_alone_by_default() {
        let mut a = args(Uuid::new_v4());
        a.first_name = Some("Pyotr".into());
        let patch = patch_from_args(&a);
        assert_eq!(patch.first_name.as_deref(), Some("Pyotr"));
        assert_eq!(patch.role_ids, None);
    }

    #[test]
    fn test_patch_clear_roles_sends_empty_list() {
        let mut a = args(Uuid::new_v4());
        a.clear_roles = true;
        assert_eq!(patch_from_args(&a).role_ids, Some(vec![]));
        assert_ne!(patch_from_args(&a), UserPatch::default());
    }
}
