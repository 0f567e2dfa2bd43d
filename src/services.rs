use crate::auth::{Admin, AdminToken, Credentials, Signup, User};
use crate::client::{self, ApiError, Client};
use crate::field::{Field, FieldData, FieldId, Normalization};
use crate::form::FieldForm;
use crate::session::{Session, SessionStore};
use anyhow::{anyhow, Context, Result};
use tracing::{debug, info, warn};

pub fn load_fields(client: &Client, opts: &Normalization) -> Result<Vec<Field>> {
    let fields = client
        .get_fields(opts)
        .context("Failed to fetch fields")?;
    debug!("Loaded {} fields", fields.len());
    Ok(fields)
}

pub fn find_field(fields: &[Field], id: FieldId) -> Result<&Field> {
    fields
        .iter()
        .find(|f| f.id == id)
        .ok_or_else(|| anyhow!("No field with id {id}"))
}

/// One listing as the API stores it, for editing.
pub fn stored_field(client: &Client, id: FieldId) -> Result<FieldData> {
    client
        .get_field_data()
        .context("Failed to fetch fields")?
        .into_iter()
        .find(|f| f.id == id)
        .ok_or_else(|| anyhow!("No field with id {id}"))
}

/// The featured fields in their configured order. When some of them are
/// missing the rest of the list fills in. At most `count` are returned.
pub fn showcase_fields<'a>(
    fields: &'a [Field],
    featured: &[FieldId],
    count: usize,
) -> Vec<&'a Field> {
    let selected: Vec<&Field> = featured
        .iter()
        .filter_map(|id| fields.iter().find(|f| f.id == *id))
        .collect();
    if selected.len() == featured.len() {
        return selected.into_iter().take(count).collect();
    }

    let fallback = fields.iter().filter(|f| !featured.contains(&f.id));
    selected.into_iter().chain(fallback).take(count).collect()
}

pub fn signup(
    client: &Client,
    store: &SessionStore,
    session: &mut Session,
    signup: &Signup,
) -> Result<User> {
    let user = client.signup(signup)?;
    info!("Signed up as {}", user.email);
    session.login_user(user.clone());
    store.save(session)?;
    Ok(user)
}

pub fn login(
    client: &Client,
    store: &SessionStore,
    session: &mut Session,
    credentials: &Credentials,
) -> Result<User> {
    let user = client.login(credentials)?;
    info!("Logged in as {}", user.email);
    session.login_user(user.clone());
    store.save(session)?;
    Ok(user)
}

pub fn logout(store: &SessionStore, session: &mut Session) -> Result<Option<User>> {
    let user = session.logout_user();
    store.save(session)?;
    Ok(user)
}

pub fn admin_login(
    client: &Client,
    store: &SessionStore,
    session: &mut Session,
    credentials: &Credentials,
) -> Result<Admin> {
    let (admin, token) = client.admin_login(credentials)?;
    info!("Logged in as admin {}", admin.email);
    session.login_admin(admin.clone(), token);
    store.save(session)?;
    Ok(admin)
}

pub fn admin_logout(store: &SessionStore, session: &mut Session) -> Result<Option<Admin>> {
    let admin = session.logout_admin();
    store.save(session)?;
    Ok(admin)
}

/// Whether a failed profile check means the stored token is no good. Only
/// an answer from the API counts; network trouble keeps the session.
fn rejects_token(err: &ApiError) -> bool {
    matches!(err, ApiError::Status { .. })
}

/// Check the stored admin token against the API. A rejected or unusable
/// token is dropped from the session.
pub fn restore_admin(
    client: &Client,
    store: &SessionStore,
    session: &mut Session,
) -> Result<AdminToken> {
    restore_admin_with(store, session, |token| client.admin_profile(token))
}

fn restore_admin_with<F>(
    store: &SessionStore,
    session: &mut Session,
    fetch_profile: F,
) -> Result<AdminToken>
where
    F: FnOnce(&AdminToken) -> client::Result<Admin>,
{
    let Some(token) = session.admin_token().cloned() else {
        return Err(anyhow!("Admin login required"));
    };
    if token.decode().is_none() {
        warn!("Stored admin token is not a Basic token, logging out");
        session.logout_admin();
        store.save(session)?;
        return Err(anyhow!("Admin login required"));
    }

    match fetch_profile(&token) {
        Ok(admin) => {
            session.login_admin(admin, token.clone());
            store.save(session)?;
            Ok(token)
        }
        Err(err) if rejects_token(&err) => {
            warn!("Stored admin session was rejected: {err}");
            session.logout_admin();
            store.save(session)?;
            Err(anyhow!("Admin session expired, please log in again"))
        }
        Err(err) => Err(err).context("Failed to check the admin session"),
    }
}

/// Create or update depending on the form, then fetch the whole list again.
pub fn save_field(
    client: &Client,
    token: &AdminToken,
    form: &FieldForm,
    opts: &Normalization,
) -> Result<Vec<Field>> {
    let payload = form.build_payload()?;
    let saved = match form.id {
        Some(id) => client
            .update_field(id, &payload, token)
            .with_context(|| format!("Failed to update field {id}"))?,
        None => client
            .create_field(&payload, token)
            .context("Failed to create field")?,
    };
    info!("Saved field {} ({})", saved.id, payload.name);
    load_fields(client, opts)
}

pub fn delete_field(
    client: &Client,
    token: &AdminToken,
    id: FieldId,
    opts: &Normalization,
) -> Result<Vec<Field>> {
    client
        .delete_field(id, token)
        .with_context(|| format!("Failed to delete field {id}"))?;
    info!("Deleted field {id}");
    load_fields(client, opts)
}
