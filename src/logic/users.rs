use crate::logic::validate::{self, UserCreateRequest, UserUpdateRequest};
use crate::logic::ServiceResult;
use crate::model::{Id, User, UserFilter};
use crate::store::UserRepository;

pub async fn create_user<S: UserRepository + ?Sized>(
    store: &S,
    request: UserCreateRequest,
) -> ServiceResult<User> {
    let new_user = validate::new_user(request)?;
    let user = store.save_user(User::new(new_user)).await?;

    log::info!("Created user {}", user.id);
    Ok(user)
}

pub async fn list_users<S: UserRepository + ?Sized>(
    store: &S,
    filter: &UserFilter,
) -> ServiceResult<Vec<User>> {
    Ok(store.find_users(filter).await?)
}

pub async fn get_user<S: UserRepository + ?Sized>(store: &S, user_id: &Id) -> ServiceResult<User> {
    Ok(store.get_user_by_id(user_id).await?)
}

/// Load the user, overwrite the fields present in the request, save it back.
///
/// The read and the write are separate round trips with no lock or version
/// check between them: concurrent updates resolve as last write wins.
pub async fn update_user<S: UserRepository + ?Sized>(
    store: &S,
    user_id: &Id,
    request: UserUpdateRequest,
) -> ServiceResult<User> {
    let changes = validate::user_changes(request)?;

    let mut user = store.get_user_by_id(user_id).await?;
    changes.apply_to(&mut user);

    let user = store.save_user(user).await?;
    log::debug!("Updated user {}", user.id);
    Ok(user)
}

pub async fn delete_user<S: UserRepository + ?Sized>(store: &S, user_id: &Id) -> ServiceResult<()> {
    let user = store.get_user_by_id(user_id).await?;
    store.delete_user(&user).await?;

    log::info!("Deleted user {}", user.id);
    Ok(())
}
