use std::collections::HashMap;

use log::debug;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewUser, Role, User},
    traits::UserApiError,
};

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, UserApiError> {
    let mobile = user.mobile.clone();
    let result = sqlx::query_as::<_, User>(
        r#"
            INSERT INTO users (name, mobile, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(user.name)
    .bind(user.mobile)
    .bind(user.password_hash)
    .bind(user.role)
    .fetch_one(conn)
    .await;
    match result {
        Ok(user) => {
            debug!("🗃️ User #{} ({}) inserted", user.id, user.role);
            Ok(user)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(UserApiError::UserAlreadyExists(mobile)),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user: Option<User> =
        sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(&mut *conn).await?;
    match user {
        Some(mut user) => {
            user.canteens = canteen_ids_for_user(user.id, conn).await?;
            Ok(Some(user))
        },
        None => Ok(None),
    }
}

pub async fn fetch_user_by_mobile(mobile: &str, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user: Option<User> =
        sqlx::query_as("SELECT * FROM users WHERE mobile = $1").bind(mobile).fetch_optional(&mut *conn).await?;
    match user {
        Some(mut user) => {
            user.canteens = canteen_ids_for_user(user.id, conn).await?;
            Ok(Some(user))
        },
        None => Ok(None),
    }
}

/// Fetches the users with the given ids, in id order. Unknown ids are skipped.
pub async fn fetch_users(ids: &[i64], conn: &mut SqliteConnection) -> Result<Vec<User>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM users WHERE id IN (");
    let mut list = builder.separated(", ");
    for id in ids {
        list.push_bind(*id);
    }
    builder.push(") ORDER BY id");
    let users = builder.build_query_as::<User>().fetch_all(&mut *conn).await?;
    attach_canteens(users, conn).await
}

pub async fn list_users(conn: &mut SqliteConnection) -> Result<Vec<User>, sqlx::Error> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id").fetch_all(&mut *conn).await?;
    attach_canteens(users, conn).await
}

pub async fn set_role(user_id: i64, role: Role, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET role = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(role)
        .bind(user_id)
        .execute(conn)
        .await?;
    debug!("🗃️ User #{user_id} now has role {role}");
    Ok(())
}

pub async fn canteen_ids_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<i64>, sqlx::Error> {
    let ids: Vec<(i64,)> =
        sqlx::query_as("SELECT canteen_id FROM canteen_admins WHERE user_id = $1 ORDER BY canteen_id")
            .bind(user_id)
            .fetch_all(conn)
            .await?;
    Ok(ids.into_iter().map(|(id,)| id).collect())
}

async fn attach_canteens(mut users: Vec<User>, conn: &mut SqliteConnection) -> Result<Vec<User>, sqlx::Error> {
    let links: Vec<(i64, i64)> =
        sqlx::query_as("SELECT user_id, canteen_id FROM canteen_admins ORDER BY canteen_id").fetch_all(conn).await?;
    let mut by_user: HashMap<i64, Vec<i64>> = HashMap::new();
    for (user_id, canteen_id) in links {
        by_user.entry(user_id).or_default().push(canteen_id);
    }
    for user in &mut users {
        user.canteens = by_user.remove(&user.id).unwrap_or_default();
    }
    Ok(users)
}
