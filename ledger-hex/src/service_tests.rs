//! LedgerService unit tests.

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use ledger_types::{
        AppError, CreateInvoiceRequest, DomainError, ErrorKind, Invoice, InvoiceId,
        InvoiceReceipt, InvoiceStatus, LedgerRepository, ListUsersQuery, Money, NewInvoice,
        RepoError, SettleInvoiceRequest, Settlement, User, UserDirectory, UserId, UserPage,
    };

    use crate::{LedgerService, RetryPolicy};

    /// Simple in-memory repository for testing the service layer.
    pub struct MockRepo {
        users: Mutex<HashMap<UserId, User>>,
        invoices: Mutex<HashMap<InvoiceId, Invoice>>,
        next_invoice_id: AtomicI64,
        /// Settlement attempts that fail with a transient error before the
        /// next one is allowed through
        transient_failures: AtomicUsize,
        settle_calls: AtomicUsize,
        insert_calls: AtomicUsize,
        /// Overrides the status read back by `insert_invoice`
        receipt_status: Option<&'static str>,
    }

    impl MockRepo {
        pub fn new() -> Self {
            Self {
                users: Mutex::new(HashMap::new()),
                invoices: Mutex::new(HashMap::new()),
                next_invoice_id: AtomicI64::new(1),
                transient_failures: AtomicUsize::new(0),
                settle_calls: AtomicUsize::new(0),
                insert_calls: AtomicUsize::new(0),
                receipt_status: None,
            }
        }

        pub fn with_user(self, id: i64) -> Self {
            let user = User::from_parts(
                UserId::new(id),
                format!("First{}", id),
                format!("Last{}", id),
                Money::from_minor(0),
            );
            self.users.lock().unwrap().insert(user.id, user);
            self
        }

        pub fn failing_transiently(self, times: usize) -> Self {
            self.transient_failures.store(times, Ordering::SeqCst);
            self
        }

        fn balance_of(&self, id: i64) -> i64 {
            self.users.lock().unwrap()[&UserId::new(id)]
                .balance
                .minor_units()
        }
    }

    #[async_trait]
    impl UserDirectory for MockRepo {
        async fn user_exists(&self, id: UserId) -> Result<bool, RepoError> {
            Ok(self.users.lock().unwrap().contains_key(&id))
        }

        async fn get_user(&self, id: UserId) -> Result<Option<User>, RepoError> {
            Ok(self.users.lock().unwrap().get(&id).cloned())
        }

        async fn list_users(&self, page: UserPage) -> Result<Vec<User>, RepoError> {
            let mut users: Vec<User> = self
                .users
                .lock()
                .unwrap()
                .values()
                .filter(|u| u.id.get() > page.from_id)
                .cloned()
                .collect();
            users.sort_by_key(|u| u.id);
            users.truncate(page.count as usize);
            Ok(users)
        }
    }

    #[async_trait]
    impl LedgerRepository for MockRepo {
        async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<InvoiceReceipt, RepoError> {
            self.insert_calls.fetch_add(1, Ordering::SeqCst);
            if !self.users.lock().unwrap().contains_key(&invoice.user_id) {
                return Err(DomainError::UserNotFound(invoice.user_id).into());
            }

            let id = InvoiceId::new(self.next_invoice_id.fetch_add(1, Ordering::SeqCst));
            let stored = Invoice::from_parts(
                id,
                invoice.user_id,
                invoice.amount,
                invoice.label.clone(),
                InvoiceStatus::Pending,
            );
            self.invoices.lock().unwrap().insert(id, stored);

            Ok(InvoiceReceipt {
                id,
                status: self
                    .receipt_status
                    .unwrap_or(InvoiceStatus::Pending.as_str())
                    .to_string(),
            })
        }

        async fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, RepoError> {
            Ok(self.invoices.lock().unwrap().get(&id).cloned())
        }

        async fn settle_invoice(&self, settlement: &Settlement) -> Result<InvoiceId, RepoError> {
            self.settle_calls.fetch_add(1, Ordering::SeqCst);
            let pending_failure = self
                .transient_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
            if pending_failure.is_ok() {
                return Err(RepoError::Transient(
                    "could not serialize access due to concurrent update".into(),
                ));
            }

            let unusable = || DomainError::UnusableInvoice {
                invoice_id: settlement.invoice_id,
                amount: settlement.amount,
            };

            let mut invoices = self.invoices.lock().unwrap();
            let invoice = invoices
                .get_mut(&settlement.invoice_id)
                .ok_or_else(unusable)?;
            invoice.settle(settlement.amount).map_err(|_| unusable())?;

            let mut users = self.users.lock().unwrap();
            let user = users.get_mut(&invoice.user_id).ok_or_else(unusable)?;
            let credited = user
                .balance
                .minor_units()
                .checked_add(settlement.amount.minor_units())
                .ok_or_else(unusable)?;
            user.balance = Money::from_minor(credited);

            Ok(invoice.id)
        }
    }

    fn fast_retries(max_retries: usize) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    fn create_req(user_id: i64, amount: f64, label: &str) -> CreateInvoiceRequest {
        CreateInvoiceRequest {
            user_id,
            amount,
            label: label.to_string(),
        }
    }

    fn settle_req(invoice_id: InvoiceId, amount: f64) -> SettleInvoiceRequest {
        SettleInvoiceRequest {
            invoice_id: invoice_id.get(),
            amount,
            reference: "wire-001".to_string(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Invoice ledger
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_create_invoice_is_pending() {
        let service = LedgerService::new(MockRepo::new().with_user(1));

        let id = service
            .create_invoice(create_req(1, 150.0, "order1"))
            .await
            .unwrap();

        let stored = service.repo().get_invoice(id).await.unwrap().unwrap();
        assert_eq!(stored.status(), InvoiceStatus::Pending);
        assert_eq!(stored.amount().minor_units(), 15000);
        assert_eq!(stored.label, "order1");
    }

    #[tokio::test]
    async fn test_create_invoice_below_minimum_never_reaches_storage() {
        let service = LedgerService::new(MockRepo::new().with_user(1));

        let result = service.create_invoice(create_req(1, 50.0, "cheap")).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(service.repo().insert_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_create_invoice_boundary_amount() {
        let service = LedgerService::new(MockRepo::new().with_user(1));

        assert!(service.create_invoice(create_req(1, 99.99, "edge")).await.is_err());
        assert!(service.create_invoice(create_req(1, 100.0, "edge")).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_invoice_unknown_user() {
        let service = LedgerService::new(MockRepo::new());

        let result = service
            .create_invoice(create_req(999_999, 150.0, "order1"))
            .await;

        match result {
            Err(AppError::Validation(msg)) => assert!(msg.contains("999999")),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(service.repo().insert_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_create_invoice_rejects_unexpected_read_back() {
        let mut repo = MockRepo::new().with_user(1);
        repo.receipt_status = Some("paid");
        let service = LedgerService::new(repo);

        let result = service.create_invoice(create_req(1, 150.0, "order1")).await;

        match result {
            Err(AppError::Validation(msg)) => assert!(msg.contains("integrity")),
            other => panic!("expected integrity failure, got {:?}", other),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Settlement engine
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_settle_invoice_credits_user() {
        let service = LedgerService::new(MockRepo::new().with_user(1));
        let id = service
            .create_invoice(create_req(1, 150.0, "order1"))
            .await
            .unwrap();

        let settled = service.settle_invoice(settle_req(id, 150.0)).await.unwrap();

        assert_eq!(settled, id);
        assert_eq!(service.repo().balance_of(1), 15000);
        let stored = service.repo().get_invoice(id).await.unwrap().unwrap();
        assert_eq!(stored.status(), InvoiceStatus::Paid);
    }

    #[tokio::test]
    async fn test_settle_invoice_twice_is_rejected() {
        let service = LedgerService::new(MockRepo::new().with_user(1));
        let id = service
            .create_invoice(create_req(1, 150.0, "order1"))
            .await
            .unwrap();
        service.settle_invoice(settle_req(id, 150.0)).await.unwrap();

        let second = service.settle_invoice(settle_req(id, 150.0)).await;

        assert!(matches!(second, Err(AppError::Validation(_))));
        assert_eq!(service.repo().balance_of(1), 15000);
    }

    #[tokio::test]
    async fn test_settle_retries_transient_failures() {
        let repo = MockRepo::new().with_user(1).failing_transiently(2);
        let service = LedgerService::with_retry_policy(repo, fast_retries(3));
        let id = service
            .create_invoice(create_req(1, 150.0, "order1"))
            .await
            .unwrap();

        service.settle_invoice(settle_req(id, 150.0)).await.unwrap();

        assert_eq!(service.repo().settle_calls.load(Ordering::SeqCst), 3);
        assert_eq!(service.repo().balance_of(1), 15000);
    }

    #[tokio::test]
    async fn test_settle_gives_up_after_max_retries() {
        let repo = MockRepo::new().with_user(1).failing_transiently(10);
        let service = LedgerService::with_retry_policy(repo, fast_retries(2));
        let id = service
            .create_invoice(create_req(1, 150.0, "order1"))
            .await
            .unwrap();

        let result = service.settle_invoice(settle_req(id, 150.0)).await;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transient);
        // One attempt plus two retries
        assert_eq!(service.repo().settle_calls.load(Ordering::SeqCst), 3);
        assert_eq!(service.repo().balance_of(1), 0);
    }

    #[tokio::test]
    async fn test_settle_validation_failures_are_not_retried() {
        let service =
            LedgerService::with_retry_policy(MockRepo::new().with_user(1), fast_retries(3));
        let id = service
            .create_invoice(create_req(1, 150.0, "order1"))
            .await
            .unwrap();

        let result = service.settle_invoice(settle_req(id, 151.0)).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(service.repo().settle_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_settle_rejects_bad_request_before_storage() {
        let service = LedgerService::new(MockRepo::new().with_user(1));

        let mut req = settle_req(InvoiceId::new(1), 150.0);
        req.reference = String::new();
        assert!(matches!(
            service.settle_invoice(req).await,
            Err(AppError::Validation(_))
        ));

        let req = settle_req(InvoiceId::new(0), 150.0);
        assert!(service.settle_invoice(req).await.is_err());

        assert_eq!(service.repo().settle_calls.load(Ordering::SeqCst), 0);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // User directory
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_list_users_defaults_and_cap() {
        let mut repo = MockRepo::new();
        for id in 1..=60 {
            repo = repo.with_user(id);
        }
        let service = LedgerService::new(repo);

        let all = service.list_users(ListUsersQuery::default()).await.unwrap();
        assert_eq!(all.len(), 50);
        assert_eq!(all[0].id, UserId::new(1));

        let capped = service
            .list_users(ListUsersQuery {
                from_id: Some(55),
                count: Some(500),
            })
            .await
            .unwrap();
        assert_eq!(
            capped.iter().map(|u| u.id.get()).collect::<Vec<_>>(),
            vec![56, 57, 58, 59, 60]
        );
    }

    #[tokio::test]
    async fn test_list_users_rejects_bad_page() {
        let service = LedgerService::new(MockRepo::new());

        let result = service
            .list_users(ListUsersQuery {
                from_id: Some(-1),
                count: None,
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = service
            .list_users(ListUsersQuery {
                from_id: None,
                count: Some(0),
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_users_empty() {
        let service = LedgerService::new(MockRepo::new());

        let users = service.list_users(ListUsersQuery::default()).await.unwrap();

        assert!(users.is_empty());
    }
}
