use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::cancellation::CancellationToken;

use crate::common::DatabaseResult;
use crate::context::DbContext;
use crate::entity::Entity;
use crate::repository::GenericRepository;
use crate::store::Store;

type RepositoryCache = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

/// One logical unit of work, usually one inbound request.
///
/// Hands out exactly one [`GenericRepository`] per entity type, all sharing
/// one [`DbContext`], and flushes their staged changes together in
/// [`complete`](Self::complete).
///
/// ```ignore
/// let uow = UnitOfWork::with_cancellation(&store, token);
/// let materials = uow.repository::<Material>();
/// let material = materials.add(material).await?;
/// uow.repository::<MaterialTransaction>().add(receipt).await?;
/// uow.complete().await?;
/// ```
pub struct UnitOfWork {
    context: Arc<DbContext>,
    repositories: Mutex<RepositoryCache>,
}

impl UnitOfWork {
    pub fn new(store: &Store) -> Self {
        Self::with_cancellation(store, CancellationToken::new())
    }

    /// Unit of work whose store round-trips stop once `cancellation` fires.
    pub fn with_cancellation(store: &Store, cancellation: CancellationToken) -> Self {
        Self {
            context: Arc::new(DbContext::with_cancellation(store.clone(), cancellation)),
            repositories: Mutex::new(HashMap::new()),
        }
    }

    pub fn context(&self) -> &Arc<DbContext> {
        &self.context
    }

    /// Repository for `E`, created on first use and cached afterwards.
    pub fn repository<E: Entity>(&self) -> Arc<GenericRepository<E>> {
        let mut repositories = self
            .repositories
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let slot = repositories.entry(TypeId::of::<E>()).or_insert_with(|| {
            Arc::new(GenericRepository::<E>::new(Arc::clone(&self.context)))
                as Arc<dyn Any + Send + Sync>
        });

        // Slots are keyed by `TypeId::of::<E>()`, so the downcast cannot miss
        match Arc::clone(slot).downcast::<GenericRepository<E>>() {
            Ok(repository) => repository,
            Err(_) => unreachable!("repository slot for {} holds another type", E::NAME),
        }
    }

    pub fn has_changes(&self) -> DatabaseResult<bool> {
        Ok(self.context.pending_changes()? > 0)
    }

    /// Flush every change staged through this unit of work.
    ///
    /// Returns the number of affected rows. Store failures are returned as
    /// they are; nothing is retried.
    pub async fn complete(&self) -> DatabaseResult<usize> {
        self.context.save_changes().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Crew {
        code: String,
    }

    impl Entity for Crew {
        type Key = String;
        const NAME: &'static str = "Crew";

        fn key(&self) -> String {
            self.code.clone()
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Site {
        id: u32,
    }

    impl Entity for Site {
        type Key = u32;
        const NAME: &'static str = "Site";

        fn key(&self) -> u32 {
            self.id
        }
    }

    #[test]
    fn test_repository_is_cached_per_type() {
        let uow = UnitOfWork::new(&Store::new());

        let first = uow.repository::<Crew>();
        let second = uow.repository::<Crew>();
        assert!(Arc::ptr_eq(&first, &second));

        let sites = uow.repository::<Site>();
        let sites_again = uow.repository::<Site>();
        assert!(Arc::ptr_eq(&sites, &sites_again));

        // Interleaved lookups still land on the slot of their own type
        assert!(Arc::ptr_eq(&first, &uow.repository::<Crew>()));
        assert!(Arc::ptr_eq(&sites, &uow.repository::<Site>()));
    }

    #[tokio::test]
    async fn test_changes_from_every_repository_share_one_flush() {
        let store = Store::new();
        let uow = UnitOfWork::new(&store);

        uow.repository::<Crew>()
            .add(Crew { code: "C-1".into() })
            .await
            .unwrap();
        uow.repository::<Site>().add(Site { id: 4 }).await.unwrap();
        assert!(uow.has_changes().unwrap());

        assert_eq!(uow.complete().await.unwrap(), 2);
        assert!(!uow.has_changes().unwrap());
        assert_eq!(store.row_count::<Crew>().unwrap(), 1);
        assert_eq!(store.row_count::<Site>().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_complete_without_changes_affects_nothing() {
        let uow = UnitOfWork::new(&Store::new());
        assert_eq!(uow.complete().await.unwrap(), 0);
    }
}
