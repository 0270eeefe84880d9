use std::sync::Arc;

use tracing::{debug, info, warn};
use warbler_credentials::CredentialManager;
use warbler_social::Social;
use warbler_store::Store;
use warbler_types::{Account, AccountId, Post, PostId, ProfileUpdate};

use crate::access::{decide, Access, Decision};
use crate::config::GuardConfig;
use crate::error::{GuardError, GuardResult};
use crate::session::{Session, SessionState};

/// The single entry point for session-scoped operations.
///
/// Each operation resolves the session, decides access, and only then
/// touches the store. A denied request never writes.
pub struct Guard<S> {
    store: Arc<S>,
    credentials: CredentialManager<S>,
    social: Social<S>,
    config: GuardConfig,
}

impl<S: Store> Guard<S> {
    pub fn new(store: Arc<S>, config: GuardConfig) -> Self {
        Self {
            credentials: CredentialManager::new(Arc::clone(&store)),
            social: Social::new(Arc::clone(&store)),
            store,
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn credentials(&self) -> &CredentialManager<S> {
        &self.credentials
    }

    pub fn social(&self) -> &Social<S> {
        &self.social
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    // ----- sessions -----

    /// Resolve a session against the store.
    ///
    /// A session whose account no longer exists is anonymous.
    pub fn resolve(&self, session: &Session) -> GuardResult<SessionState> {
        let Some(id) = session.account_id() else {
            return Ok(SessionState::Anonymous);
        };
        if self.store.read(|view| view.account(id).is_some())? {
            Ok(SessionState::Authenticated(id))
        } else {
            debug!(account = %id, "session refers to a missing account");
            Ok(SessionState::Anonymous)
        }
    }

    /// Resolve `session` and require `access`, or fail with
    /// [`GuardError::Unauthorized`].
    pub fn authorize(&self, session: &Session, access: Access) -> GuardResult<SessionState> {
        let state = self.resolve(session)?;
        match decide(&state, &access) {
            Decision::Permit => Ok(state),
            Decision::Deny => {
                warn!(%access, account = ?state.account_id(), "access unauthorized");
                Err(GuardError::Unauthorized)
            }
        }
    }

    fn acting(&self, session: &Session) -> GuardResult<AccountId> {
        self.authorize(session, Access::SelfActing)?
            .account_id()
            .ok_or(GuardError::Unauthorized)
    }

    /// Check credentials and, on success, bind the session to the account.
    ///
    /// On failure the session is left as it was.
    pub fn login(&self, session: &mut Session, handle: &str, secret: &str) -> GuardResult<Account> {
        let account = self
            .credentials
            .authenticate(handle, secret)?
            .ok_or(GuardError::InvalidCredentials)?;
        session.set(account.id);
        info!(account = %account.id, handle = %account.handle, "logged in");
        Ok(account)
    }

    pub fn logout(&self, session: &mut Session) {
        if let Some(id) = session.account_id() {
            info!(account = %id, "logged out");
        }
        session.clear();
    }

    /// Register a new account and log the session into it.
    pub fn signup(
        &self,
        session: &mut Session,
        handle: &str,
        contact: &str,
        secret: &str,
        image_ref: Option<&str>,
    ) -> GuardResult<Account> {
        let account = self.credentials.register(handle, contact, secret, image_ref)?;
        session.set(account.id);
        Ok(account)
    }

    /// Edit the session's own profile after re-checking its secret.
    pub fn edit_profile(
        &self,
        session: &Session,
        secret: &str,
        update: &ProfileUpdate,
    ) -> GuardResult<Account> {
        let acting = self.acting(session)?;
        Ok(self.credentials.update_profile(acting, secret, update)?)
    }

    // ----- posts -----

    pub fn create_post(&self, session: &Session, body: &str) -> GuardResult<Post> {
        let acting = self.acting(session)?;
        Ok(self.social.posts.create_post(acting, body)?)
    }

    pub fn show_post(&self, session: &Session, id: PostId) -> GuardResult<Post> {
        self.authorize(session, Access::Public)?;
        Ok(self.social.posts.get_post(id)?)
    }

    /// Delete a post owned by the session's account.
    ///
    /// An anonymous session is unauthorized whether or not the post exists.
    /// For a logged-in session a missing post is [`GuardError::NotFound`] and
    /// someone else's post is [`GuardError::Unauthorized`]. The ownership
    /// check and the delete run in one transaction.
    pub fn delete_post(&self, session: &Session, id: PostId) -> GuardResult<Post> {
        let acting = self.acting(session)?;
        let deleted = self.store.transaction(|tx| -> GuardResult<Post> {
            let post = tx
                .post(id)
                .ok_or_else(|| GuardError::NotFound(format!("post {id}")))?;
            let access = Access::OwnerOnly {
                owner: post.account_id,
            };
            if decide(&SessionState::Authenticated(acting), &access) == Decision::Deny {
                warn!(%access, account = %acting, post = %id, "access unauthorized");
                return Err(GuardError::Unauthorized);
            }
            tx.delete_post(id)?;
            Ok(post)
        })?;
        info!(post = %id, account = %acting, "post deleted");
        Ok(deleted)
    }

    /// Posts by the session's account and everyone it follows, newest first.
    pub fn home_timeline(&self, session: &Session) -> GuardResult<Vec<Post>> {
        let acting = self.acting(session)?;
        Ok(self
            .social
            .posts
            .home_timeline(acting, self.config.timeline_limit)?)
    }

    // ----- accounts -----

    pub fn show_account(&self, session: &Session, id: AccountId) -> GuardResult<Account> {
        self.authorize(session, Access::Public)?;
        Ok(self.social.directory.get_account(id)?)
    }

    /// Posts owned by `account`, newest first.
    pub fn posts_of(&self, session: &Session, account: AccountId) -> GuardResult<Vec<Post>> {
        self.authorize(session, Access::Public)?;
        Ok(self.social.posts.posts_by(account)?)
    }

    pub fn list_accounts(&self, session: &Session, query: Option<&str>) -> GuardResult<Vec<Account>> {
        self.authorize(session, Access::Public)?;
        Ok(self.social.directory.list_accounts(query)?)
    }

    // ----- graph -----

    pub fn follow(&self, session: &Session, target: AccountId) -> GuardResult<bool> {
        let acting = self.acting(session)?;
        Ok(self.social.graph.follow(acting, target)?)
    }

    pub fn unfollow(&self, session: &Session, target: AccountId) -> GuardResult<bool> {
        let acting = self.acting(session)?;
        Ok(self.social.graph.unfollow(acting, target)?)
    }

    pub fn following_of(&self, session: &Session, account: AccountId) -> GuardResult<Vec<Account>> {
        self.authorize(session, Access::SelfActing)?;
        Ok(self.social.graph.following(account)?)
    }

    pub fn followers_of(&self, session: &Session, account: AccountId) -> GuardResult<Vec<Account>> {
        self.authorize(session, Access::SelfActing)?;
        Ok(self.social.graph.followers(account)?)
    }

    // ----- likes -----

    pub fn like(&self, session: &Session, post: PostId) -> GuardResult<bool> {
        let acting = self.acting(session)?;
        Ok(self.social.engagement.like(acting, post)?)
    }

    pub fn unlike(&self, session: &Session, post: PostId) -> GuardResult<bool> {
        let acting = self.acting(session)?;
        Ok(self.social.engagement.unlike(acting, post)?)
    }

    /// Like the post if not yet liked, otherwise remove the like. Returns
    /// whether the post is liked afterwards.
    pub fn toggle_like(&self, session: &Session, post: PostId) -> GuardResult<bool> {
        let acting = self.acting(session)?;
        Ok(self.social.engagement.toggle_like(acting, post)?)
    }

    pub fn liked_posts_of(&self, session: &Session, account: AccountId) -> GuardResult<Vec<Post>> {
        self.authorize(session, Access::SelfActing)?;
        Ok(self.social.engagement.liked_posts(account)?)
    }
}

impl<S: Store + 'static> Guard<S> {
    /// [`login`](Self::login) with hash verification off the async runtime.
    pub async fn login_async(
        &self,
        session: &mut Session,
        handle: &str,
        secret: &str,
    ) -> GuardResult<Account> {
        let account = self
            .credentials
            .authenticate_async(handle.to_string(), secret.to_string())
            .await?
            .ok_or(GuardError::InvalidCredentials)?;
        session.set(account.id);
        info!(account = %account.id, handle = %account.handle, "logged in");
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warbler_store::InMemoryStore;
    use warbler_types::{FollowEdge, LikeEdge, NewPost};

    const ALICE: AccountId = AccountId(1);
    const BOB: AccountId = AccountId(2);
    const POST: PostId = PostId(100);

    /// Two accounts, `alice` (#1) and `bob` (#2), and post #100 owned by alice.
    fn seeded() -> Guard<InMemoryStore> {
        let guard = Guard::new(Arc::new(InMemoryStore::new()), GuardConfig::default());
        for (id, handle) in [(ALICE, "alice"), (BOB, "bob")] {
            let pending = guard
                .credentials()
                .signup(
                    Some(handle),
                    Some(&format!("{handle}@test.com")),
                    Some("password"),
                    None,
                )
                .unwrap()
                .with_id(id);
            guard.credentials().create(pending).unwrap();
        }
        guard
            .social()
            .posts
            .publish(NewPost::new(ALICE, "first warble").with_id(POST))
            .unwrap();
        guard
    }

    fn has_post(guard: &Guard<InMemoryStore>, id: PostId) -> bool {
        guard.store().read(|view| view.post(id).is_some()).unwrap()
    }

    fn has_like(guard: &Guard<InMemoryStore>, account: AccountId, post: PostId) -> bool {
        guard
            .store()
            .read(|view| view.has_like(LikeEdge::new(account, post)))
            .unwrap()
    }

    #[test]
    fn resolve_sessions() {
        let guard = seeded();
        assert_eq!(
            guard.resolve(&Session::anonymous()).unwrap(),
            SessionState::Anonymous
        );
        assert_eq!(
            guard.resolve(&Session::for_account(ALICE)).unwrap(),
            SessionState::Authenticated(ALICE)
        );
        assert_eq!(
            guard.resolve(&Session::for_account(AccountId(12345))).unwrap(),
            SessionState::Anonymous
        );
    }

    #[test]
    fn login_and_logout() {
        let guard = seeded();
        let mut session = Session::anonymous();

        let err = guard.login(&mut session, "alice", "wrong").unwrap_err();
        assert!(matches!(err, GuardError::InvalidCredentials));
        assert_eq!(session, Session::anonymous());

        let err = guard.login(&mut session, "nobody", "password").unwrap_err();
        assert!(matches!(err, GuardError::InvalidCredentials));

        let account = guard.login(&mut session, "alice", "password").unwrap();
        assert_eq!(account.id, ALICE);
        assert_eq!(session.account_id(), Some(ALICE));

        guard.logout(&mut session);
        assert_eq!(session, Session::anonymous());
    }

    #[test]
    fn signup_logs_in() {
        let guard = seeded();
        let mut session = Session::anonymous();
        let account = guard
            .signup(&mut session, "carol", "carol@test.com", "password", None)
            .unwrap();
        assert_eq!(session.account_id(), Some(account.id));

        let mut other = Session::anonymous();
        let err = guard
            .signup(&mut other, "carol", "carol2@test.com", "password", None)
            .unwrap_err();
        assert!(err.constraint().is_some());
        assert_eq!(other, Session::anonymous());
    }

    #[test]
    fn create_post_requires_login() {
        let guard = seeded();
        let post = guard
            .create_post(&Session::for_account(BOB), "Hello")
            .unwrap();
        assert_eq!(post.account_id, BOB);
        assert_eq!(post.body, "Hello");

        let err = guard.create_post(&Session::anonymous(), "Hello").unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn stale_session_cannot_post() {
        let guard = seeded();
        let err = guard
            .create_post(&Session::for_account(AccountId(12345)), "Hello")
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(guard.posts_of(&Session::anonymous(), ALICE).unwrap().len(), 1);
    }

    #[test]
    fn show_post_is_public() {
        let guard = seeded();
        let post = guard.show_post(&Session::anonymous(), POST).unwrap();
        assert_eq!(post.body, "first warble");

        let err = guard.show_post(&Session::anonymous(), PostId(99999)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn only_the_owner_deletes() {
        let guard = seeded();

        let err = guard.delete_post(&Session::for_account(BOB), POST).unwrap_err();
        assert!(err.is_unauthorized());
        assert!(has_post(&guard, POST));

        let err = guard.delete_post(&Session::anonymous(), POST).unwrap_err();
        assert!(err.is_unauthorized());
        assert!(has_post(&guard, POST));

        let deleted = guard.delete_post(&Session::for_account(ALICE), POST).unwrap();
        assert_eq!(deleted.id, POST);
        assert!(!has_post(&guard, POST));
    }

    #[test]
    fn delete_missing_post() {
        let guard = seeded();
        let err = guard
            .delete_post(&Session::for_account(ALICE), PostId(99999))
            .unwrap_err();
        assert!(err.is_not_found());

        // Anonymous callers learn nothing about existence.
        let err = guard
            .delete_post(&Session::anonymous(), PostId(99999))
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn delete_removes_likes() {
        let guard = seeded();
        guard.like(&Session::for_account(BOB), POST).unwrap();
        guard.delete_post(&Session::for_account(ALICE), POST).unwrap();
        assert!(!has_like(&guard, BOB, POST));
    }

    #[test]
    fn follow_and_listings() {
        let guard = seeded();
        let alice = Session::for_account(ALICE);

        assert!(guard.follow(&alice, BOB).unwrap());
        assert!(!guard.follow(&alice, BOB).unwrap());
        assert!(guard
            .store()
            .read(|view| view.has_follow(FollowEdge::new(ALICE, BOB)))
            .unwrap());

        let following = guard.following_of(&alice, ALICE).unwrap();
        assert_eq!(following.len(), 1);
        assert_eq!(following[0].handle, "bob");
        let followers = guard.followers_of(&alice, BOB).unwrap();
        assert_eq!(followers[0].id, ALICE);

        assert!(guard.unfollow(&alice, BOB).unwrap());
        assert!(guard.following_of(&alice, ALICE).unwrap().is_empty());
    }

    #[test]
    fn graph_needs_login() {
        let guard = seeded();
        let anon = Session::anonymous();
        assert!(guard.follow(&anon, BOB).unwrap_err().is_unauthorized());
        assert!(guard.following_of(&anon, ALICE).unwrap_err().is_unauthorized());
        assert!(guard.followers_of(&anon, ALICE).unwrap_err().is_unauthorized());
        assert!(guard.liked_posts_of(&anon, ALICE).unwrap_err().is_unauthorized());
    }

    #[test]
    fn follow_errors() {
        let guard = seeded();
        let alice = Session::for_account(ALICE);
        assert!(matches!(
            guard.follow(&alice, ALICE).unwrap_err(),
            GuardError::Validation(_)
        ));
        assert!(guard.follow(&alice, AccountId(999)).unwrap_err().is_not_found());
    }

    #[test]
    fn anonymous_like_changes_nothing() {
        let guard = seeded();
        let err = guard.like(&Session::anonymous(), POST).unwrap_err();
        assert!(err.is_unauthorized());
        assert!(!has_like(&guard, BOB, POST));
        assert!(!has_like(&guard, ALICE, POST));
    }

    #[test]
    fn like_unknown_post() {
        let guard = seeded();
        let err = guard.like(&Session::for_account(BOB), PostId(99999)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn like_toggle_and_unlike() {
        let guard = seeded();
        let bob = Session::for_account(BOB);

        assert!(guard.toggle_like(&bob, POST).unwrap());
        assert!(has_like(&guard, BOB, POST));
        assert_eq!(guard.liked_posts_of(&bob, BOB).unwrap()[0].id, POST);

        // An anonymous unlike leaves the like in place.
        let err = guard.unlike(&Session::anonymous(), POST).unwrap_err();
        assert!(err.is_unauthorized());
        assert!(has_like(&guard, BOB, POST));

        assert!(!guard.toggle_like(&bob, POST).unwrap());
        assert!(!has_like(&guard, BOB, POST));
        assert!(!guard.unlike(&bob, POST).unwrap());
    }

    #[test]
    fn home_timeline_includes_followed() {
        let guard = seeded();
        let bob = Session::for_account(BOB);
        guard.create_post(&bob, "from bob").unwrap();
        assert_eq!(guard.home_timeline(&bob).unwrap().len(), 1);

        guard.follow(&bob, ALICE).unwrap();
        let timeline = guard.home_timeline(&bob).unwrap();
        assert_eq!(timeline.len(), 2);
        assert!(guard.home_timeline(&Session::anonymous()).unwrap_err().is_unauthorized());
    }

    #[test]
    fn edit_profile_rechecks_secret() {
        let guard = seeded();
        let alice = Session::for_account(ALICE);
        let update = ProfileUpdate {
            bio: Some("hello there".into()),
            ..Default::default()
        };

        let err = guard.edit_profile(&alice, "wrong", &update).unwrap_err();
        assert!(matches!(err, GuardError::InvalidCredentials));

        let account = guard.edit_profile(&alice, "password", &update).unwrap();
        assert_eq!(account.bio.as_deref(), Some("hello there"));

        let err = guard
            .edit_profile(&Session::anonymous(), "password", &update)
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn directory_is_public() {
        let guard = seeded();
        let anon = Session::anonymous();
        assert_eq!(guard.list_accounts(&anon, None).unwrap().len(), 2);
        assert_eq!(guard.list_accounts(&anon, Some("ali")).unwrap().len(), 1);
        assert_eq!(guard.show_account(&anon, BOB).unwrap().handle, "bob");
        assert!(guard.show_account(&anon, AccountId(999)).unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn async_login() {
        let guard = seeded();
        let mut session = Session::anonymous();
        let account = guard
            .login_async(&mut session, "bob", "password")
            .await
            .unwrap();
        assert_eq!(account.id, BOB);
        assert_eq!(session.account_id(), Some(BOB));
    }
}
