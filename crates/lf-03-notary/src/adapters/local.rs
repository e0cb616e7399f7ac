use crate::domain::verdict::NotaryVerdict;
use crate::ports::outbound::NotaryClient;
use crate::service::NotaryService;
use async_trait::async_trait;
use shared_types::{Party, SignedTransaction};
use std::sync::Arc;

/// In-process client calling a [`NotaryService`] directly.
#[derive(Clone)]
pub struct LocalNotaryClient {
    service: Arc<NotaryService>,
}

impl LocalNotaryClient {
    pub fn new(service: Arc<NotaryService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl NotaryClient for LocalNotaryClient {
    fn notary(&self) -> &Party {
        self.service.identity()
    }

    async fn notarise(&self, stx: &SignedTransaction) -> NotaryVerdict {
        self.service.notarise(stx)
    }
}
