//! Role-specific dashboard and profile view models
//!
//! A page loads the user with its joined role name and hands it to
//! [`build_profile`], which picks one of three variants from
//! [`variant_for`]:
//!
//! | Role name          | Variant          | Listings shown (own page)      | Extras                   |
//! |--------------------|------------------|--------------------------------|--------------------------|
//! | persona natural    | `persona_natural`| own recent listings            | -                        |
//! | reciclador         | `reciclador`     | available listings of others   | rating summary           |
//! | empresa            | `empresa`        | own listings                   | per-status counts, rating|
//! | admin / unknown    | `persona_natural`| own recent listings            | -                        |
//!
//! On a public profile every variant shows the user's own available
//! listings and no unread counters.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    conversation::Conversation,
    listing::{Listing, ListingFilter, ListingStatus, ListingView, StatusCount},
    notification::Notification,
    rating::{Rating, RatingSummary},
    role::RoleKind,
    user::PublicUser,
};

/// Listings embedded in a dashboard
pub const DASHBOARD_LISTING_LIMIT: i64 = 10;

/// Which presentational variant a user gets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileVariant {
    PersonaNatural,
    Reciclador,
    Empresa,
}

/// Who is looking at the profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// The user themself (dashboard, `/perfil`)
    Owner,

    /// Anyone else (`/v1/users/:id`)
    Public,
}

/// Unread counters shown to the owner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCounts {
    pub messages: i64,
    pub notifications: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaNaturalView {
    pub user: PublicUser,
    pub listings: Vec<ListingView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread: Option<UnreadCounts>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecicladorView {
    pub user: PublicUser,
    pub listings: Vec<ListingView>,
    pub rating: RatingSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread: Option<UnreadCounts>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmpresaView {
    pub user: PublicUser,
    pub listings: Vec<ListingView>,
    pub status_counts: Vec<StatusCount>,
    pub rating: RatingSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread: Option<UnreadCounts>,
}

/// Page payload, tagged with the variant name
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum ProfileView {
    PersonaNatural(PersonaNaturalView),
    Reciclador(RecicladorView),
    Empresa(EmpresaView),
}

impl ProfileView {
    pub fn variant(&self) -> ProfileVariant {
        match self {
            ProfileView::PersonaNatural(_) => ProfileVariant::PersonaNatural,
            ProfileView::Reciclador(_) => ProfileVariant::Reciclador,
            ProfileView::Empresa(_) => ProfileVariant::Empresa,
        }
    }

    pub fn user(&self) -> &PublicUser {
        match self {
            ProfileView::PersonaNatural(v) => &v.user,
            ProfileView::Reciclador(v) => &v.user,
            ProfileView::Empresa(v) => &v.user,
        }
    }
}

/// Variant for a stored role name
pub fn variant_for(role_name: &str) -> ProfileVariant {
    match RoleKind::from_role_name(role_name) {
        Some(RoleKind::Empresa) => ProfileVariant::Empresa,
        Some(RoleKind::Reciclador) => ProfileVariant::Reciclador,
        Some(RoleKind::PersonaNatural) | Some(RoleKind::Admin) | None => ProfileVariant::PersonaNatural,
    }
}

async fn unread_counts(pool: &PgPool, user_id: Uuid) -> Result<UnreadCounts, sqlx::Error> {
    Ok(UnreadCounts {
        messages: Conversation::unread_total(pool, user_id).await?,
        notifications: Notification::unread_count(pool, user_id).await?,
    })
}

fn listings_of(owner_id: Uuid, status: Option<ListingStatus>) -> ListingFilter {
    ListingFilter {
        owner_id: Some(owner_id),
        status,
        limit: DASHBOARD_LISTING_LIMIT,
        ..Default::default()
    }
}

/// Loads the data of the user's variant
pub async fn build_profile(pool: &PgPool, user: PublicUser, audience: Audience) -> Result<ProfileView, sqlx::Error> {
    let user_id = user.id;
    let variant = variant_for(&user.role_name);

    let unread = match audience {
        Audience::Owner => Some(unread_counts(pool, user_id).await?),
        Audience::Public => None,
    };

    // Visitors only see what is still on offer.
    let own_filter = match audience {
        Audience::Owner => listings_of(user_id, None),
        Audience::Public => listings_of(user_id, Some(ListingStatus::Disponible)),
    };

    let view = match variant {
        ProfileVariant::PersonaNatural => ProfileView::PersonaNatural(PersonaNaturalView {
            listings: Listing::search(pool, &own_filter).await?,
            user,
            unread,
        }),
        ProfileVariant::Reciclador => {
            let filter = match audience {
                Audience::Owner => ListingFilter {
                    status: Some(ListingStatus::Disponible),
                    exclude_owner_id: Some(user_id),
                    limit: DASHBOARD_LISTING_LIMIT,
                    ..Default::default()
                },
                Audience::Public => own_filter,
            };

            ProfileView::Reciclador(RecicladorView {
                listings: Listing::search(pool, &filter).await?,
                rating: Rating::summary_for_owner(pool, user_id).await?,
                user,
                unread,
            })
        }
        ProfileVariant::Empresa => ProfileView::Empresa(EmpresaView {
            listings: Listing::search(pool, &own_filter).await?,
            status_counts: Listing::count_by_status_for_owner(pool, user_id).await?,
            rating: Rating::summary_for_owner(pool, user_id).await?,
            user,
            unread,
        }),
    };

    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_variant_for_known_roles() {
        assert_eq!(variant_for("persona_natural"), ProfileVariant::PersonaNatural);
        assert_eq!(variant_for("Reciclador"), ProfileVariant::Reciclador);
        assert_eq!(variant_for("empresa"), ProfileVariant::Empresa);
        assert_eq!(variant_for("Empresa Recicladora"), ProfileVariant::Empresa);
    }

    #[test]
    fn test_variant_for_fallbacks() {
        assert_eq!(variant_for("admin"), ProfileVariant::PersonaNatural);
        assert_eq!(variant_for("visitante"), ProfileVariant::PersonaNatural);
        assert_eq!(variant_for(""), ProfileVariant::PersonaNatural);
    }

    #[test]
    fn test_view_is_tagged_and_hides_public_counters() {
        let view = ProfileView::Reciclador(RecicladorView {
            user: PublicUser {
                id: Uuid::new_v4(),
                email: "reciclador@example.com".to_string(),
                name: "Pedro".to_string(),
                role_name: "reciclador".to_string(),
                phone: None,
                avatar_url: None,
                bio: None,
                created_at: Utc::now(),
            },
            listings: vec![],
            rating: RatingSummary::default(),
            unread: None,
        });

        assert_eq!(view.variant(), ProfileVariant::Reciclador);
        assert_eq!(view.user().name, "Pedro");

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["variant"], "reciclador");
        assert!(json.get("unread").is_none());
        assert_eq!(json["rating"]["count"], 0);
    }
}
