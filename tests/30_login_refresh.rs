mod common;

use std::sync::Arc;

use anyhow::Result;

use backoffice_api::services::{AuthError, AuthService};

use common::{
    access_signer, access_verifier, account, refresh_signer, refresh_verifier, InMemoryAuthStore,
};

fn service(store: &InMemoryAuthStore) -> AuthService {
    AuthService::new(Arc::new(store.clone()), access_signer(15), refresh_signer(60 * 24))
}

#[tokio::test]
async fn login_issues_a_token_pair_bound_to_the_session_identifier() -> Result<()> {
    let acct = account("alice@example.com", "correct-horse");
    let user_id = acct.principal.id;
    let sid = acct.token_id.unwrap();
    let store = InMemoryAuthStore::with_account(acct);

    let output = service(&store).login("alice@example.com", "correct-horse").await?;

    assert!(!output.access_token.is_empty());
    assert!(!output.refresh_token.is_empty());
    assert_eq!(output.user.id, user_id);

    // Each token verifies against its own public key and carries the
    // account's current session identifier
    assert_eq!(access_verifier().verify(&output.access_token)?, sid);
    assert_eq!(refresh_verifier().verify(&output.refresh_token)?, sid);

    // And not against the other key
    assert!(refresh_verifier().verify(&output.access_token).is_err());
    assert!(access_verifier().verify(&output.refresh_token).is_err());
    Ok(())
}

#[tokio::test]
async fn issued_token_resolves_back_to_the_principal() -> Result<()> {
    use backoffice_api::database::AuthStore;

    let acct = account("alice@example.com", "correct-horse");
    let user_id = acct.principal.id;
    let sid = acct.token_id.unwrap();
    let store = InMemoryAuthStore::with_account(acct);

    let token = access_signer(15).issue(sid)?;
    let claimed_sid = access_verifier().verify(&token)?;
    let resolved = store.find_by_session_token(claimed_sid).await?.expect("bound account");

    assert_eq!(resolved.principal.id, user_id);
    Ok(())
}

#[tokio::test]
async fn unknown_login_is_distinct_from_bad_credentials() {
    let store = InMemoryAuthStore::with_account(account("alice@example.com", "correct-horse"));

    let err = service(&store).login("nobody@example.com", "whatever").await.unwrap_err();
    assert!(matches!(err, AuthError::UnknownLogin));
}

#[tokio::test]
async fn account_without_a_password_cannot_log_in() {
    let mut acct = account("invited@example.com", "placeholder");
    acct.password_hash = None;
    acct.token_id = None;
    let store = InMemoryAuthStore::with_account(acct);

    let err = service(&store).login("invited@example.com", "anything").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let store = InMemoryAuthStore::with_account(account("alice@example.com", "correct-horse"));

    let err = service(&store).login("alice@example.com", "wrong-horse").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn disabled_account_is_rejected_with_correct_password() {
    let store = InMemoryAuthStore::with_account(account("alice@example.com", "correct-horse"));
    store.set_enabled("alice@example.com", false);

    let err = service(&store).login("alice@example.com", "correct-horse").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn refresh_issues_a_new_pair_for_the_same_session() -> Result<()> {
    let acct = account("alice@example.com", "correct-horse");
    let sid = acct.token_id.unwrap();
    let store = InMemoryAuthStore::with_account(acct);
    let svc = service(&store);

    let login = svc.login("alice@example.com", "correct-horse").await?;
    let pair = svc.refresh(sid)?;

    // Fresh pair, same session identifier in the claims
    assert_eq!(access_verifier().verify(&pair.access_token)?, sid);
    assert_eq!(refresh_verifier().verify(&pair.refresh_token)?, sid);
    assert_eq!(
        access_verifier().verify(&login.access_token)?,
        access_verifier().verify(&pair.access_token)?,
    );
    Ok(())
}
