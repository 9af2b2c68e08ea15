use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use folio_service::FolioService;
use folio_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<FolioService>,
}
impl AppState {
	pub async fn new(config: folio_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		Ok(Self::from_service(FolioService::new(config, db)))
	}

	pub fn from_service(service: FolioService) -> Self {
		Self { service: Arc::new(service) }
	}

	/// A fresh deadline for one request.
	pub fn deadline(&self) -> Deadline {
		Deadline::after(Duration::from_millis(self.service.cfg.service.request_timeout_ms))
	}
}

/// Cancels its token once the timeout passes. Dropping it stops the timer.
pub struct Deadline {
	token: CancellationToken,
	timer: JoinHandle<()>,
}
impl Deadline {
	pub fn after(timeout: Duration) -> Self {
		let token = CancellationToken::new();
		let expiring = token.clone();
		let timer = tokio::spawn(async move {
			tokio::time::sleep(timeout).await;

			expiring.cancel();
		});

		Self { token, timer }
	}

	pub fn token(&self) -> &CancellationToken {
		&self.token
	}
}
impl Drop for Deadline {
	fn drop(&mut self) {
		self.timer.abort();
	}
}
