use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::MemberAPI,
    auth::User,
    entities::{Member, MemberUpdate, NewMember},
    error::Error,
};

#[async_trait]
impl MemberAPI for Engine {
    #[tracing::instrument(skip(self, spec))]
    async fn create_member(&self, _user: User, spec: NewMember) -> Result<Member, Error> {
        let member = Member::new(spec)?;

        self.bounded(self.store.insert_member(&member)).await?;

        tracing::info!(member_id = %member.id, "member created");

        Ok(member)
    }

    #[tracing::instrument(skip(self))]
    async fn find_member(&self, _user: User, id: Uuid) -> Result<Member, Error> {
        self.fetch_member(id).await
    }

    #[tracing::instrument(skip(self, update))]
    async fn update_member(
        &self,
        user: User,
        id: Uuid,
        update: MemberUpdate,
    ) -> Result<Member, Error> {
        let mut member = self.fetch_member(id).await?;

        self.authorize(user, "update", member.clone())?;

        member.apply(update)?;

        self.bounded(self.store.update_member(&member)).await?;

        tracing::info!("member profile updated");

        Ok(member)
    }

    #[tracing::instrument(skip(self, push_token))]
    async fn update_push_token(
        &self,
        user: User,
        id: Uuid,
        push_token: String,
    ) -> Result<Member, Error> {
        let mut member = self.fetch_member(id).await?;

        self.authorize(user, "update", member.clone())?;

        let push_token = push_token.trim();

        if push_token.is_empty() {
            return Err(Error::invalid_input_error("push token is required"));
        }

        member.push_token = Some(push_token.to_string());

        self.bounded(self.store.update_member(&member)).await?;

        Ok(member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures::harness;

    #[tokio::test]
    async fn create_member_validates_input() {
        let h = harness();

        let err = h
            .engine
            .create_member(
                User::new_system_user(),
                NewMember {
                    name: " ".into(),
                    email: "nobody@campus.edu".into(),
                    phone: None,
                    profile_image_url: None,
                },
            )
            .await
            .unwrap_err();

        assert!(err.is_invalid_input_error());
    }

    #[tokio::test]
    async fn find_member_reports_missing_members() {
        let h = harness();

        let err = h
            .engine
            .find_member(User::new_system_user(), Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(err.is_not_found_error());
    }

    #[tokio::test]
    async fn only_the_member_updates_their_push_token() {
        let h = harness();
        let sana = h.member("Sana").await;
        let omar = h.member("Omar").await;

        let err = h
            .engine
            .update_push_token(User::new(omar.id), sana.id, "token-1".into())
            .await
            .unwrap_err();
        assert!(err.is_unauthorized_error());

        let updated = h
            .engine
            .update_push_token(User::new(sana.id), sana.id, " token-1 ".into())
            .await
            .unwrap();
        assert_eq!(updated.push_token.as_deref(), Some("token-1"));

        let stored = h
            .engine
            .find_member(User::new_system_user(), sana.id)
            .await
            .unwrap();
        assert_eq!(stored.push_token.as_deref(), Some("token-1"));
    }

    #[tokio::test]
    async fn members_update_only_their_own_profile() {
        let h = harness();
        let sana = h.member("Sana").await;
        let omar = h.member("Omar").await;

        let update = MemberUpdate {
            name: Some("Sana Malik".into()),
            profile_image_url: Some("https://img.example/sana.png".into()),
            ..Default::default()
        };

        let err = h
            .engine
            .update_member(User::new(omar.id), sana.id, update.clone())
            .await
            .unwrap_err();
        assert!(err.is_unauthorized_error());

        let err = h
            .engine
            .update_member(User::new_system_user(), sana.id, update.clone())
            .await
            .unwrap_err();
        assert!(err.is_unauthorized_error());

        let updated = h
            .engine
            .update_member(User::new(sana.id), sana.id, update)
            .await
            .unwrap();
        assert_eq!(updated.name, "Sana Malik");

        let stored = h
            .engine
            .find_member(User::new_system_user(), sana.id)
            .await
            .unwrap();
        assert_eq!(stored.name, "Sana Malik");
        assert_eq!(stored.email, "sana@campus.edu");
        assert_eq!(
            stored.profile_image_url.as_deref(),
            Some("https://img.example/sana.png")
        );
    }

    #[tokio::test]
    async fn update_member_refuses_empty_updates() {
        let h = harness();
        let sana = h.member("Sana").await;

        let err = h
            .engine
            .update_member(User::new(sana.id), sana.id, MemberUpdate::default())
            .await
            .unwrap_err();

        assert!(err.is_invalid_input_error());
    }
}
