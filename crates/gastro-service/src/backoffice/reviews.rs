//! Review operations.

use super::{BackOffice, Tenant};
use crate::events::ChangeKind;
use gastro_core::reviews::{ReplyInput, Review, ReviewCounters};
use gastro_core::{Error, Result, ReviewId};

impl BackOffice {
    /// All reviews, newest first.
    pub async fn list_reviews(&self, tenant: &Tenant) -> Result<Vec<Review>> {
        self.store.list_reviews(tenant.restaurant).await
    }

    /// Stores a reply draft for the automation to publish.
    pub async fn save_reply(
        &self,
        tenant: &Tenant,
        id: ReviewId,
        input: ReplyInput,
    ) -> Result<Review> {
        let update = input.validate()?;
        let review = self
            .store
            .save_reply(tenant.restaurant, id, &update)
            .await?
            .ok_or_else(|| Error::not_found("review", id))?;
        tracing::info!(restaurant = %tenant.restaurant, review = %id, "Reply saved");
        self.publish(tenant.restaurant, ChangeKind::ReviewReplied { review_id: id });
        Ok(review)
    }

    /// Pending and negative-pending counts.
    pub async fn review_counters(&self, tenant: &Tenant) -> Result<ReviewCounters> {
        let reviews = self.store.list_reviews(tenant.restaurant).await?;
        Ok(ReviewCounters::from_reviews(&reviews))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::super::testing::{Harness, local, today};
    use super::*;
    use crate::events::ChangeEvent;
    use chrono::Duration;
    use gastro_core::RestaurantId;

    pub(crate) fn review(restaurant: RestaurantId, rating: u8, days_ago: i64) -> Review {
        Review {
            id: ReviewId::new(),
            restaurante_id: restaurant,
            google_review_id: None,
            nombre_cliente: Some("Luis".into()),
            rating,
            comentario: Some("Comida fría".into()),
            responded: false,
            respuesta_texto: None,
            fecha_resena: Some(local(today() - Duration::days(days_ago), 21, 0)),
        }
    }

    #[tokio::test]
    async fn test_save_reply_keeps_pending() {
        let h = Harness::new().await;
        let r = review(h.restaurant(), 2, 1);
        h.store.add_review(r.clone());
        let mut rx = h.office.events().subscribe();

        let saved = h
            .office
            .save_reply(
                &h.tenant,
                r.id,
                ReplyInput {
                    text: " Lo sentimos mucho. ".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(saved.respuesta_texto.as_deref(), Some("Lo sentimos mucho."));
        assert!(!saved.responded);

        let ChangeEvent { kind, .. } = rx.recv().await.unwrap();
        assert_eq!(kind, ChangeKind::ReviewReplied { review_id: r.id });

        let counters = h.office.review_counters(&h.tenant).await.unwrap();
        assert_eq!(counters.pending, 1);
        assert_eq!(counters.negative_pending, 1);
    }

    #[tokio::test]
    async fn test_save_reply_empty_text() {
        let h = Harness::new().await;
        let r = review(h.restaurant(), 5, 0);
        h.store.add_review(r.clone());
        let err = h
            .office
            .save_reply(&h.tenant, r.id, ReplyInput { text: "  ".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[tokio::test]
    async fn test_save_reply_other_tenant() {
        let h = Harness::new().await;
        let r = review(RestaurantId::new(), 4, 0);
        h.store.add_review(r.clone());
        let err = h
            .office
            .save_reply(&h.tenant, r.id, ReplyInput { text: "Gracias".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let h = Harness::new().await;
        let old = review(h.restaurant(), 4, 5);
        let new = review(h.restaurant(), 5, 1);
        h.store.add_review(old.clone());
        h.store.add_review(new.clone());
        let list = h.office.list_reviews(&h.tenant).await.unwrap();
        assert_eq!(
            list.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![new.id, old.id]
        );
    }
}
