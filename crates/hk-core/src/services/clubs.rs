//! Reading clubs: membership lists only.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{required, Services};
use crate::error::{AppError, Result};
use crate::models::Club;

/// Public clubs suggested alongside the user's own.
pub const PUBLIC_CLUB_SUGGESTIONS: u32 = 10;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewClub {
    pub name: String,
    pub description: String,
    pub topic: String,
    pub is_private: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClubDirectory {
    pub user_clubs: Vec<Club>,
    pub public_clubs: Vec<Club>,
}

impl Services {
    pub async fn list_clubs(&self, user_id: Uuid) -> Result<ClubDirectory> {
        let clubs = &self.repos.clubs;
        Ok(ClubDirectory {
            user_clubs: clubs.clubs_for_member(user_id).await?,
            public_clubs: clubs
                .public_clubs_excluding(user_id, PUBLIC_CLUB_SUGGESTIONS)
                .await?,
        })
    }

    /// The creator becomes the first member.
    pub async fn create_club(&self, user_id: Uuid, new: NewClub) -> Result<Club> {
        let club = Club {
            id: Uuid::now_v7(),
            name: required(&new.name, "club name")?,
            description: new.description.trim().to_string(),
            topic: new.topic.trim().to_string(),
            creator_id: user_id,
            members: vec![user_id],
            is_private: new.is_private,
            created_at: self.clock.now(),
            current_book: None,
        };
        self.repos.clubs.create_club(club.clone()).await?;
        log::info!("user {user_id} created club {}", club.id);
        Ok(club)
    }

    pub async fn join_club(&self, user_id: Uuid, club_id: Uuid) -> Result<Club> {
        let mut club = self
            .repos
            .clubs
            .get_club(club_id)
            .await?
            .ok_or_else(|| AppError::not_found("Club", club_id))?;
        if club.members.contains(&user_id) {
            return Err(AppError::Conflict("already a member of this club".into()));
        }
        self.repos.clubs.add_member(club_id, user_id).await?;
        club.members.push(user_id);
        Ok(club)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::testing::{fixed_now, FixedClock, MockPorts};

    fn club(creator_id: Uuid) -> Club {
        Club {
            id: Uuid::now_v7(),
            name: "Sci-fi Sundays".into(),
            description: String::new(),
            topic: "science fiction".into(),
            creator_id,
            members: vec![creator_id],
            is_private: false,
            created_at: fixed_now(),
            current_book: None,
        }
    }

    #[tokio::test]
    async fn creator_is_first_member() {
        let user = Uuid::now_v7();
        let mut ports = MockPorts::default();
        ports.clubs
            .expect_create_club()
            .withf(move |c| c.members == vec![user] && c.creator_id == user)
            .times(1)
            .returning(|_| Ok(()));

        let created = ports
            .into_services(Arc::new(FixedClock::new(fixed_now())))
            .create_club(
                user,
                NewClub {
                    name: " Sci-fi Sundays ".into(),
                    ..NewClub::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(created.name, "Sci-fi Sundays");
        assert_eq!(created.member_count(), 1);
    }

    #[tokio::test]
    async fn joining_twice_conflicts() {
        let user = Uuid::now_v7();
        let existing = club(user);
        let mut ports = MockPorts::default();
        ports.clubs
            .expect_get_club()
            .returning(move |_| Ok(Some(existing.clone())));
        ports.clubs.expect_add_member().never();

        let err = ports
            .into_services(Arc::new(FixedClock::new(fixed_now())))
            .join_club(user, Uuid::now_v7())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn joining_appends_member() {
        let joiner = Uuid::now_v7();
        let existing = club(Uuid::now_v7());
        let mut ports = MockPorts::default();
        ports.clubs
            .expect_get_club()
            .returning(move |_| Ok(Some(existing.clone())));
        ports.clubs
            .expect_add_member()
            .withf(move |_, user| *user == joiner)
            .times(1)
            .returning(|_, _| Ok(()));

        let joined = ports
            .into_services(Arc::new(FixedClock::new(fixed_now())))
            .join_club(joiner, Uuid::now_v7())
            .await
            .unwrap();

        assert_eq!(joined.member_count(), 2);
    }

    #[tokio::test]
    async fn unknown_club_is_not_found() {
        let mut ports = MockPorts::default();
        ports.clubs.expect_get_club().returning(|_| Ok(None));

        let err = ports
            .into_services(Arc::new(FixedClock::new(fixed_now())))
            .join_club(Uuid::now_v7(), Uuid::now_v7())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(entity, _) if entity == "Club"));
    }
}
